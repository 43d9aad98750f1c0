//! Error types for homestay-web
//!
//! Handlers return [`ApiResult`]. Errors render as an HTML error page;
//! upstream detail is logged and never shown to the browser.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::homes::HomeError;
use crate::upload::UploadError;
use crate::views;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Submitted data failed validation (400)
    #[error("{0}")]
    ValidationError(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body could not be understood (400)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Database, media service or IO failure (500)
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationError(_) | ApiError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::ValidationError(msg) | ApiError::MalformedRequest(msg) => msg.clone(),
            ApiError::NotFound(msg) => format!("Not found: {}", msg),
            ApiError::UpstreamFailure(detail) => {
                error!(detail = %detail, "Request failed");
                "Something went wrong. Please try again later.".to_string()
            }
        };

        (status, Html(views::error_page(status.as_u16(), &message))).into_response()
    }
}

impl From<HomeError> for ApiError {
    fn from(err: HomeError) -> Self {
        match err {
            HomeError::Validation(msg) => ApiError::ValidationError(msg),
            HomeError::NotFound(id) => ApiError::NotFound(format!("home {}", id)),
            HomeError::Database(e) => ApiError::UpstreamFailure(e.to_string()),
            HomeError::Media(e) => ApiError::UpstreamFailure(e.to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Malformed(msg) => ApiError::MalformedRequest(msg),
            UploadError::Transport(msg) => ApiError::UpstreamFailure(msg),
            UploadError::Storage(e) => ApiError::UpstreamFailure(e.to_string()),
        }
    }
}

impl From<homestay_common::Error> for ApiError {
    fn from(err: homestay_common::Error) -> Self {
        match err {
            homestay_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            homestay_common::Error::InvalidInput(msg) => ApiError::ValidationError(msg),
            other => ApiError::UpstreamFailure(other.to_string()),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaError;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(HomeError::Validation("No image provided".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(HomeError::NotFound(Uuid::nil())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(UploadError::Malformed("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(UploadError::Storage(MediaError::Network("down".into()))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_detail_not_rendered() {
        let response = ApiError::UpstreamFailure("api_secret=hunter2".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

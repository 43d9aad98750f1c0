//! HTTP handlers for homestay-web
//!
//! Host pages live under `/host` behind the session gate; everything else is
//! public.

pub mod auth;
pub mod health;
pub mod host;
pub mod store;

pub use auth::auth_routes;
pub use health::health_routes;
pub use host::host_routes;
pub use store::store_routes;

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::views;

/// 302 Found to `location`
///
/// `axum::response::Redirect::to` answers 303; form posts here are expected
/// to answer 302.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Router fallback
pub async fn page_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html(views::error_page(404, "Page not found")),
    )
}

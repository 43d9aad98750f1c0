//! Public listing pages

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::gate::SessionContext;
use crate::{views, AppState};

/// GET / and GET /homes
pub async fn home_list(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Html<String>> {
    let homes = state.homes().list().await?;
    Ok(Html(views::home_list(&homes, session.user.as_ref())))
}

/// GET /homes/:id
pub async fn home_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Html<String>> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound(format!("home {}", id)))?;
    let home = state.homes().read_for_edit(id).await?;
    Ok(Html(views::home_detail(&home, session.user.as_ref())))
}

pub fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_list))
        .route("/homes", get(home_list))
        .route("/homes/:id", get(home_detail))
}

//! Host pages: add, edit, list and delete homes
//!
//! Mounted under `/host` behind [`crate::gate::require_host`].

use axum::{
    extract::{Multipart, Path, Query, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::found;
use crate::error::{ApiError, ApiResult};
use crate::gate::SessionContext;
use crate::homes::{HomeError, HomeForm};
use crate::upload::parse_submission;
use crate::{views, AppState};

const HOST_HOME_LIST: &str = "/host/host-home-list";

/// Query of GET /host/edit-home/:id
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub editing: Option<String>,
}

/// GET /host/add-home
pub async fn add_home_form(Extension(session): Extension<SessionContext>) -> Html<String> {
    Html(views::edit_home(None, session.user.as_ref()))
}

/// POST /host/add-home
pub async fn add_home(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let homes = state.homes();
    let submission = parse_submission(multipart, state.media.as_ref()).await?;

    let form = match HomeForm::from_fields(&submission.fields) {
        Ok(form) => form,
        Err(e) => {
            homes.discard_uploads(submission.files).await;
            return Err(e.into());
        }
    };

    let id = homes.create(form, submission.files).await?;
    info!(home_id = %id, "Host added home");

    Ok(found(HOST_HOME_LIST))
}

/// GET /host/edit-home/:id?editing=true|false
///
/// Unknown ids go back to the listing. `editing` other than `true` renders
/// the blank add form.
pub async fn edit_home_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<EditQuery>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Response> {
    let Ok(id) = Uuid::parse_str(&id) else {
        warn!(home_id = %id, "Invalid home id for editing");
        return Ok(found(HOST_HOME_LIST));
    };

    let home = match state.homes().read_for_edit(id).await {
        Ok(home) => home,
        Err(HomeError::NotFound(_)) => {
            info!(home_id = %id, "Home not found for editing");
            return Ok(found(HOST_HOME_LIST));
        }
        Err(e) => return Err(e.into()),
    };

    let editing = query.editing.as_deref() == Some("true");
    let page = views::edit_home(editing.then_some(&home), session.user.as_ref());

    Ok(Html(page).into_response())
}

/// POST /host/edit-home
///
/// The home id comes from the hidden `id` form field.
pub async fn edit_home(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let homes = state.homes();
    let submission = parse_submission(multipart, state.media.as_ref()).await?;

    let id = submission
        .fields
        .get("id")
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
    let Some(id) = id else {
        homes.discard_uploads(submission.files).await;
        return Err(ApiError::MalformedRequest("Missing or invalid home id".to_string()));
    };

    let form = match HomeForm::from_fields(&submission.fields) {
        Ok(form) => form,
        Err(e) => {
            homes.discard_uploads(submission.files).await;
            return Err(e.into());
        }
    };

    match homes.update(id, form, submission.files).await {
        Ok(report) => {
            info!(home_id = %id, ?report, "Host updated home");
            Ok(found(HOST_HOME_LIST))
        }
        Err(HomeError::NotFound(id)) => {
            error!(home_id = %id, "Home to update not found");
            Err(ApiError::UpstreamFailure(format!("Home to update not found: {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /host/host-home-list
pub async fn host_home_list(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
) -> ApiResult<Html<String>> {
    let homes = state.homes().list().await?;
    Ok(Html(views::host_home_list(&homes, session.user.as_ref())))
}

/// POST /host/delete-home/:id
pub async fn delete_home(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::NotFound(format!("home {}", id)))?;

    let report = state.homes().delete(id).await?;
    info!(home_id = %id, ?report, "Host deleted home");

    Ok(found(HOST_HOME_LIST))
}

/// Build host routes (gate applied by the caller)
pub fn host_routes() -> Router<AppState> {
    Router::new()
        .route("/add-home", get(add_home_form).post(add_home))
        .route("/edit-home/:id", get(edit_home_form))
        .route("/edit-home", post(edit_home))
        .route("/host-home-list", get(host_home_list))
        .route("/delete-home/:id", post(delete_home))
}

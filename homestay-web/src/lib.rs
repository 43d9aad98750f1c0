//! homestay-web library - home listing service
//!
//! Hosts publish homes with a photo and an optional house-rules PDF; guests
//! browse them. Files go to a [`media::MediaStore`] (local folder or remote
//! media service), records to SQLite.

use axum::{extract::DefaultBodyLimit, middleware, Router};
use homestay_common::config::{StorageBackend, RULES_DIR, UPLOADS_DIR};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod gate;
pub mod homes;
pub mod media;
pub mod upload;
pub mod views;

use homes::HomeService;
use media::MediaStore;

/// Runtime settings handlers need besides the pool
#[derive(Debug, Clone)]
pub struct Settings {
    pub root_folder: PathBuf,
    pub max_upload_bytes: usize,
    pub session_ttl_hours: i64,
    pub secure_cookie: bool,
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub media: Arc<dyn MediaStore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: SqlitePool, media: Arc<dyn MediaStore>, settings: Settings) -> Self {
        Self {
            db,
            media,
            settings: Arc::new(settings),
        }
    }

    /// Home record service over this state's pool and media store
    pub fn homes(&self) -> HomeService {
        HomeService::new(self.db.clone(), self.media.clone())
    }
}

/// Build application router
///
/// `/host` pages require a session; everything else is public. Stored
/// files are served from the root folder when the local backend is active.
pub fn build_router(state: AppState) -> Router {
    let host = api::host_routes().route_layer(middleware::from_fn(gate::require_host));

    let mut app = Router::new()
        .nest("/host", host)
        .merge(api::store_routes())
        .merge(api::auth_routes())
        .merge(api::health_routes())
        .fallback(api::page_not_found);

    if state.media.backend() == StorageBackend::Local {
        let root = &state.settings.root_folder;
        app = app
            .nest_service("/uploads", ServeDir::new(root.join(UPLOADS_DIR)))
            .nest_service("/rules", ServeDir::new(root.join(RULES_DIR)));
    }

    app.layer(middleware::from_fn_with_state(state.clone(), gate::load_session))
        .layer(DefaultBodyLimit::max(state.settings.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

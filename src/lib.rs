use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    repositories::{DocumentStore, MongoDocumentStore},
    services::{CloudMirror, DriveMirror, PhotoStorage},
};

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn DocumentStore>,
    pub mirror: Arc<dyn CloudMirror>,
    pub photo_storage: Arc<PhotoStorage>,
}

impl AppState {
    /// Connect to the configured store and build the Drive mirror
    pub async fn new(config: Settings) -> Result<Self, crate::error::ApiError> {
        let database = crate::database::connect(&config).await;
        let store: Arc<dyn DocumentStore> = Arc::new(MongoDocumentStore::new(database));
        let mirror: Arc<dyn CloudMirror> = Arc::new(DriveMirror::from_settings(&config)?);
        Ok(Self::with_components(config, store, mirror))
    }

    /// Create application state from already constructed collaborators
    pub fn with_components(
        config: Settings,
        store: Arc<dyn DocumentStore>,
        mirror: Arc<dyn CloudMirror>,
    ) -> Self {
        let photo_storage = Arc::new(PhotoStorage::new(config.uploads_path()));
        Self {
            config: Arc::new(config),
            store,
            mirror,
            photo_storage,
        }
    }
}

/// Build the HTTP router with all endpoints and middleware
pub fn create_router(app_state: AppState) -> Router {
    let body_limit = usize::try_from(app_state.config.max_upload_bytes).unwrap_or(usize::MAX);
    let cors_layer = middleware::create_cors_layer(&app_state.config.cors_allow_origins);

    Router::new()
        .route("/", get(handlers::root))
        .route("/test", get(handlers::diagnostic))
        .route("/api/sessions", post(handlers::create_session))
        .route("/api/sessions/:id", get(handlers::get_session))
        .route("/api/photos", post(handlers::upload_photo))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn(middleware::request_logging_middleware))
        .layer(middleware::create_logging_layer())
        .layer(cors_layer)
}

use axum::{
    extract::{Path, State},
    response::Json,
};
use axum_extra::extract::WithRejection;
use serde_json::Value;

use crate::{
    error::ApiError,
    models::{PhotoSession, SessionCreate, SessionCreated},
    repositories::SESSION_COLLECTION,
    AppState,
};

pub async fn create_session(
    State(app_state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SessionCreate>, ApiError>,
) -> Result<Json<SessionCreated>, ApiError> {
    let session = PhotoSession::new(payload)?;
    let session_id = app_state
        .store
        .insert(SESSION_COLLECTION, session.to_document())
        .await?;

    tracing::info!(
        session_id = %session_id,
        site_name = %session.site_name,
        date = %session.date,
        "session created"
    );
    Ok(Json(SessionCreated { session_id }))
}

pub async fn get_session(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = app_state
        .store
        .fetch_by_id(SESSION_COLLECTION, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    Ok(Json(session))
}

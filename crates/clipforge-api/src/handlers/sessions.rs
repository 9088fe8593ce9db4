//! Session handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::sessions::Session;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Start a new session.
pub async fn create_session(State(state): State<AppState>) -> ApiResult<Json<CreateSessionResponse>> {
    let session = state.sessions.create().await?;
    Ok(Json(CreateSessionResponse {
        session_id: session.id,
    }))
}

/// Full message log of a session.
pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Session>> {
    state
        .sessions
        .load(&session_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("session not found"))
}

//! Video generation handler.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use axum::{Extension, Json};
use clipforge_models::{normalize, GenerationOptions, GenerationResult};
use clipforge_pipeline::PipelineError;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::handlers::videos::content_type_for;
use crate::middleware::RequestId;
use crate::sessions::{build_brief, SessionStore};
use crate::state::AppState;

/// Reply recorded in the session before generation starts.
const ASSISTANT_REPLY: &str =
    "Generating a short preview video from your prompt. It will be returned when ready.";

#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub options: Option<Value>,
}

/// Generate (or serve from cache, or fall back to the sample) a video for
/// a prompt, recording the exchange in the session log.
pub async fn generate_video(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    payload: Result<Json<GenerateVideoRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    // Reject bad input before anything is written to the session log.
    normalize(&request.prompt, state.generator.config().max_prompt_chars)
        .map_err(PipelineError::from)?;
    let options = GenerationOptions::from_json(request.options.as_ref().unwrap_or(&Value::Null))
        .map_err(PipelineError::from)?;

    let session_id = match request.session_id.as_deref().filter(|s| !s.is_empty()) {
        Some(id) if !SessionStore::is_valid_id(id) => {
            return Err(ApiError::bad_request("invalid session id"))
        }
        Some(id) => state.sessions.ensure(id).await?.id,
        None => state.sessions.create().await?.id,
    };

    let prompt = request.prompt.trim();
    let session = state
        .sessions
        .append_message(&session_id, "user", prompt, meta(&[("source", "api".into())]))
        .await?;

    let brief = build_brief(&session.messages, prompt);
    state
        .sessions
        .append_message(
            &session_id,
            "assistant",
            ASSISTANT_REPLY,
            meta(&[("brief", brief.clone().into())]),
        )
        .await?;

    let request_id = request_id
        .map(|Extension(RequestId(id))| id)
        .unwrap_or_default();
    info!(
        request_id = %request_id,
        session_id = %session_id,
        "Generating video"
    );

    let provider = state.provider.as_deref();
    let result = if request_id.is_empty() {
        state.generator.generate(&request.prompt, &options, provider).await?
    } else {
        state
            .generator
            .generate_with_request_id(&request_id, &request.prompt, &options, provider)
            .await?
    };

    let data = tokio::fs::read(&result.artifact_path).await.map_err(|e| {
        ApiError::internal(format!(
            "artifact {} unreadable: {}",
            result.artifact_path.display(),
            e
        ))
    })?;

    record_outcome(&state, &session_id, &brief, &result).await;

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&result.artifact_path))
        .header("x-session-id", session_id.as_str())
        .header("x-video-mock", if result.is_fallback() { "true" } else { "false" })
        .header("x-generation-time", format!("{:.2}", result.elapsed_seconds()))
        .header("x-cache", if result.is_cached() { "hit" } else { "miss" });
    if let Some(reason) = result.fallback_reason() {
        builder = builder.header("x-fallback-reason", reason.as_str());
    }

    builder
        .body(Body::from(data))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Append the served artifact to the session log. Failures are logged only;
/// the artifact is already in hand.
async fn record_outcome(state: &AppState, session_id: &str, brief: &str, result: &GenerationResult) {
    let label = if result.is_fallback() {
        "MOCK VIDEO SERVED"
    } else if result.is_cached() {
        "CACHED VIDEO SERVED"
    } else {
        "VIDEO GENERATED"
    };

    let file_name = result
        .artifact_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut entries = vec![
        ("video", Value::from(file_name)),
        ("mock", Value::from(result.is_fallback())),
        ("outcome", Value::from(result.outcome.as_str())),
        ("elapsed", Value::from(result.elapsed_seconds())),
        ("request_id", Value::from(result.request_id.as_str())),
    ];
    if let Some(reason) = result.fallback_reason() {
        entries.push(("reason", Value::from(reason.to_string())));
    }

    if let Err(e) = state
        .sessions
        .append_message(
            session_id,
            "assistant",
            &format!("[{}] brief={}", label, brief),
            meta(&entries),
        )
        .await
    {
        warn!(session_id = %session_id, error = %e, "Failed to record generation in session");
    }
}

fn meta(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

//! Artifact listing and download.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use axum::Json;
use clipforge_models::VideoFormat;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ListVideosResponse {
    pub videos: Vec<String>,
}

/// List generated artifacts by file name.
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<ListVideosResponse>> {
    let videos = state.generator.store().list().await?;
    Ok(Json(ListVideosResponse { videos }))
}

/// Download one generated artifact.
pub async fn get_video(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ApiResult<Response> {
    let path = state.generator.store().resolve(&file_name)?;

    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found("video not found"))
        }
        Err(e) => return Err(ApiError::internal(e.to_string())),
    };

    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&path))
        .body(Body::from(data))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// Content type from the artifact's extension, MP4 when unknown.
pub(crate) fn content_type_for(path: &std::path::Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(VideoFormat::from_extension)
        .unwrap_or_default()
        .content_type()
}

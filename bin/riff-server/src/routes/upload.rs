//! Source-audio upload proxy (`/api/upload`).
//!
//! Uploaded files are checked for size and type, then forwarded to the
//! inference service, which answers with a storage path usable as
//! `src_audio_path` or `reference_audio_path`.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use riff_types::{ErrorBody, UploadResponse, is_allowed_audio_type};
use serde_json::Value;
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::state::AppState;
use crate::upstream::UpstreamError;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(paths(upload_audio), components(schemas(UploadResponse)))]
pub struct UploadApi;

pub fn router(max_upload_bytes: usize) -> Router<Arc<AppState>> {
    Router::new().route(
        "/upload",
        post(upload_audio).layer(DefaultBodyLimit::max(max_upload_bytes.saturating_add(MULTIPART_OVERHEAD))),
    )
}

/// Upload source audio (`POST /api/upload`).
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "upload",
    request_body(
        content_type = "multipart/form-data",
        description = "One `file` part holding mp3, wav, flac, ogg, m4a, mp4 or aac audio"
    ),
    responses(
        (status = 200, description = "Stored; `path` refers to the upload", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unsupported file", body = ErrorBody),
        (status = 500, description = "Inference service rejected the upload", body = ErrorBody),
    )
)]
pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ServerError> {
    let max_bytes = state.config.max_upload_bytes();
    let too_large = || ServerError::BadRequest(format!("File too large (max {}MB)", state.config.max_upload_mb));
    let read_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            ServerError::BadRequest(format!("Invalid multipart body: {e}"))
        }
    };

    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().filter(|ct| !ct.is_empty()).map(str::to_owned);

        // Size is judged before type.
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > max_bytes {
                return Err(too_large());
            }
        }
        if let Some(ct) = &content_type {
            if !is_allowed_audio_type(ct) {
                return Err(ServerError::BadRequest(format!("Unsupported file type: {ct}")));
            }
        }
        debug!(%file_name, ?content_type, size = bytes.len(), "received upload");
        upload = Some((file_name, content_type, bytes));
        break;
    }

    let Some((file_name, content_type, bytes)) = upload else {
        return Err(ServerError::BadRequest("No audio file provided".into()));
    };

    let size = bytes.len();
    match state.modal.upload(&file_name, content_type.as_deref(), bytes).await {
        Ok(data) => {
            info!(%file_name, size, "upload forwarded");
            Ok(Json(data))
        }
        Err(UpstreamError::Status { body, .. }) => {
            Err(ServerError::Upstream(format!("Upload failed: {body}")))
        }
        Err(e) => {
            warn!(%file_name, error = %e, "upload failed");
            Err(ServerError::Upstream("Failed to upload audio".into()))
        }
    }
}

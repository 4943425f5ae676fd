//! Generation queue proxy (`/api/generate`).
//!
//! Requests are normalised into a [`SubmitPayload`] (defaults plus clamps)
//! before they reach the inference service; status and cancel calls are
//! relayed as-is.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use riff_types::{
    CancelResponse, ErrorBody, GenerateParams, JobStatusResponse, SubmitPayload, SubmitResponse,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi};

use crate::error::ServerError;
use crate::routes::audio::audio_response;
use crate::state::AppState;
use crate::upstream::UpstreamError;

#[derive(OpenApi)]
#[openapi(
    paths(submit, status_or_cancel, generate_file),
    components(schemas(GenerateParams, SubmitResponse, JobStatusResponse, CancelResponse, ErrorBody))
)]
pub struct GenerateApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate", post(submit).get(status_or_cancel))
        .route("/generate/file", post(generate_file))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobQuery {
    /// Job to inspect.
    job_id: Option<String>,
    /// Any non-empty value cancels the job instead.
    cancel: Option<String>,
}

fn parse_params(body: &[u8]) -> Result<GenerateParams, ServerError> {
    serde_json::from_slice(body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid request body: {e}")))
}

/// Submit a generation job (`POST /api/generate`).
///
/// Fills defaults, clamps every numeric knob, and forwards the payload to the
/// inference queue. The queue's answer (`job_id`, `position`) is relayed.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generate",
    request_body = GenerateParams,
    responses(
        (status = 200, description = "Job queued", body = SubmitResponse),
        (status = 400, description = "Malformed body or unknown task type", body = ErrorBody),
        (status = 500, description = "Inference service rejected the job", body = ErrorBody),
    )
)]
pub async fn submit(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ServerError> {
    let params = parse_params(&body)?;
    let payload = SubmitPayload::from_params(params, state.config.max_duration);

    match state.modal.submit(&payload).await {
        Ok(data) => {
            info!(job_id = %data["job_id"], duration = payload.duration, "job submitted");
            Ok(Json(data))
        }
        Err(UpstreamError::Status { body, .. }) => {
            Err(ServerError::Upstream(format!("Failed to submit: {body}")))
        }
        Err(e) => {
            warn!(error = %e, "submit failed");
            Err(ServerError::Upstream("Failed to submit. Please try again.".into()))
        }
    }
}

/// Poll or cancel a job (`GET /api/generate?job_id=…[&cancel=1]`).
#[utoipa::path(
    get,
    path = "/api/generate",
    tag = "generate",
    params(JobQuery),
    responses(
        (status = 200, description = "Job status, or `{cancelled}` when cancelling", body = JobStatusResponse),
        (status = 400, description = "Missing job_id", body = ErrorBody),
        (status = 404, description = "Unknown job", body = ErrorBody),
        (status = 500, description = "Inference service unreachable", body = ErrorBody),
    )
)]
pub async fn status_or_cancel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JobQuery>,
) -> Result<Response, ServerError> {
    let job_id = query
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("job_id required".into()))?;

    if query.cancel.is_some_and(|c| !c.is_empty()) {
        return match state.modal.cancel(&job_id).await {
            Ok(cancelled) => {
                info!(%job_id, cancelled, "cancel requested");
                Ok(Json(CancelResponse { cancelled }).into_response())
            }
            Err(UpstreamError::Status { .. }) => {
                Err(ServerError::Upstream("Failed to cancel job".into()))
            }
            Err(e) => {
                warn!(%job_id, error = %e, "cancel failed");
                Err(ServerError::Upstream("Failed to check status".into()))
            }
        };
    }

    match state.modal.status(&job_id).await {
        Ok(data) => Ok(Json(data).into_response()),
        Err(UpstreamError::Status { .. }) => Err(ServerError::NotFound("Job not found".into())),
        Err(e) => {
            warn!(%job_id, error = %e, "status poll failed");
            Err(ServerError::Upstream("Failed to check status".into()))
        }
    }
}

/// Generate synchronously and return the audio (`POST /api/generate/file`).
///
/// Takes the same body as `POST /api/generate` but blocks until the audio is
/// ready, so it suits short clips and scripted use.
#[utoipa::path(
    post,
    path = "/api/generate/file",
    tag = "generate",
    request_body = GenerateParams,
    responses(
        (status = 200, description = "Generated audio", content_type = "audio/mpeg"),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 500, description = "Generation failed", body = ErrorBody),
    )
)]
pub async fn generate_file(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ServerError> {
    let params = parse_params(&body)?;
    let payload = SubmitPayload::from_params(params, state.config.max_duration);

    match state.modal.generate_file(&payload).await {
        Ok(upstream) => Ok(audio_response(upstream, "riff")),
        Err(UpstreamError::Status { body, .. }) => {
            Err(ServerError::Upstream(format!("Failed to generate: {body}")))
        }
        Err(e) => {
            warn!(error = %e, "synchronous generation failed");
            Err(ServerError::Upstream("Failed to generate. Please try again.".into()))
        }
    }
}

//! Audio download proxy (`/api/audio`).

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use riff_types::{AudioFormat, ErrorBody};
use serde::Deserialize;
use tracing::{debug, warn};
use utoipa::{IntoParams, OpenApi};

use crate::error::ServerError;
use crate::state::AppState;
use crate::upstream::UpstreamError;

#[derive(OpenApi)]
#[openapi(paths(fetch_audio))]
pub struct AudioApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/audio", get(fetch_audio))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AudioQuery {
    job_id: Option<String>,
    /// File index for jobs that produced several files.
    index: Option<String>,
}

/// Stream an upstream audio response back to the caller.
///
/// The content type is normalised to mp3, wav or flac and the file is offered
/// as `<stem>.<ext>`.
pub fn audio_response(upstream: reqwest::Response, stem: &str) -> Response {
    let format = AudioFormat::sniff(
        upstream
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    );
    let disposition = format!("attachment; filename=\"{stem}.{}\"", format.extension());
    let mut response = Body::from_stream(upstream.bytes_stream()).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.mime_type()));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// Download generated audio (`GET /api/audio?job_id=…[&index=N]`).
#[utoipa::path(
    get,
    path = "/api/audio",
    tag = "audio",
    params(AudioQuery),
    responses(
        (status = 200, description = "Audio file", content_type = "audio/mpeg"),
        (status = 400, description = "Missing job_id or bad index", body = ErrorBody),
        (status = 404, description = "Audio not available", body = ErrorBody),
        (status = 500, description = "Inference service unreachable", body = ErrorBody),
    )
)]
pub async fn fetch_audio(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AudioQuery>,
) -> Result<Response, ServerError> {
    let job_id = query
        .job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::BadRequest("job_id required".into()))?;
    let index = match query.index.as_deref().filter(|i| !i.is_empty()) {
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
            ServerError::BadRequest(format!("index must be a non-negative integer, got {raw:?}"))
        })?),
        None => None,
    };

    match state.modal.audio(&job_id, index).await {
        Ok(upstream) => {
            debug!(%job_id, ?index, "streaming audio");
            let stem = match index {
                Some(i) => format!("riff_{i}"),
                None => "riff".to_owned(),
            };
            Ok(audio_response(upstream, &stem))
        }
        Err(UpstreamError::Status { .. }) => Err(ServerError::NotFound("Audio not found".into())),
        Err(e) => {
            warn!(%job_id, error = %e, "audio fetch failed");
            Err(ServerError::Upstream("Failed to fetch audio".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing::{MockUpstream, get};

    #[tokio::test]
    async fn audio_is_streamed_with_normalised_headers() {
        let mock = MockUpstream::start().await;

        let (status, headers, body) = get(&mock.app(), "/api/audio?job_id=job-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "audio/mpeg");
        assert_eq!(headers["content-disposition"], "attachment; filename=\"riff.mp3\"");
        assert_eq!(&body[..], b"ID3-job-1");

        let (_, headers, _) = get(&mock.app(), "/api/audio?job_id=wav").await;
        assert_eq!(headers["content-type"], "audio/wav");
    }

    #[tokio::test]
    async fn indexed_audio() {
        let mock = MockUpstream::start().await;
        let (status, headers, body) = get(&mock.app(), "/api/audio?job_id=job-1&index=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-disposition"], "attachment; filename=\"riff_1.mp3\"");
        assert_eq!(&body[..], b"ID3-job-1-1");

        let (status, _, _) = get(&mock.app(), "/api/audio?job_id=job-1&index=two").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_audio_is_404() {
        let mock = MockUpstream::start().await;
        let (status, _, body) = get(&mock.app(), "/api/audio?job_id=missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&body).unwrap()["error"], "Audio not found");

        let (status, _, _) = get(&mock.app(), "/api/audio").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

//! Lyrics writer proxy (`/api/lyrics`).

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use riff_types::{ErrorBody, LyricsRequest, LyricsResponse};
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::prompt;
use crate::state::AppState;
use crate::upstream::UpstreamError;

const RETRY_MESSAGE: &str = "Failed to generate lyrics. Please try again.";

#[derive(OpenApi)]
#[openapi(paths(write_lyrics), components(schemas(LyricsRequest, LyricsResponse)))]
pub struct LyricsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/lyrics", post(write_lyrics))
}

/// Draft a caption and lyrics (`POST /api/lyrics`).
///
/// Builds a system prompt from the requested density, duration, variant,
/// language and voice, then asks the chat model for a `{caption, lyrics}`
/// JSON object.
#[utoipa::path(
    post,
    path = "/api/lyrics",
    tag = "lyrics",
    request_body = LyricsRequest,
    responses(
        (status = 200, description = "Drafted caption and lyrics", body = LyricsResponse),
        (status = 400, description = "Missing prompt", body = ErrorBody),
        (status = 500, description = "Unparseable body, model unavailable or unparseable reply", body = ErrorBody),
    )
)]
pub async fn write_lyrics(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<LyricsResponse>, ServerError> {
    let Some(xai) = state.xai.as_ref() else {
        return Err(ServerError::Upstream("XAI_API_KEY not configured".into()));
    };

    let request: LyricsRequest = serde_json::from_slice(&body).map_err(|e| {
        debug!(error = %e, "unparseable lyrics request");
        ServerError::Upstream(RETRY_MESSAGE.into())
    })?;
    let Some(user_prompt) = request.prompt.as_deref().filter(|p| !p.is_empty()) else {
        return Err(ServerError::BadRequest("prompt is required".into()));
    };

    let system = prompt::system_prompt(&request);
    debug!(
        variant = ?request.variant,
        density = ?request.lyrics_density,
        contrast = ?request.contrast,
        model = xai.model(),
        "requesting lyrics"
    );

    let content = match xai.complete(&system, user_prompt).await {
        Ok(Some(content)) => content,
        Ok(None) => return Err(ServerError::Upstream("No response from AI".into())),
        Err(UpstreamError::Status { status, body }) => {
            warn!(%status, %body, "lyrics model rejected request");
            return Err(ServerError::Upstream("Failed to generate lyrics".into()));
        }
        Err(e) => {
            warn!(error = %e, "lyrics request failed");
            return Err(ServerError::Upstream(RETRY_MESSAGE.into()));
        }
    };

    let drafted: LyricsResponse = serde_json::from_str(&prompt::strip_fences(&content)).map_err(|e| {
        warn!(error = %e, raw = %content, "unparseable lyrics reply");
        ServerError::Upstream(RETRY_MESSAGE.into())
    })?;

    info!(caption = %drafted.caption, lyrics_len = drafted.lyrics.len(), "lyrics drafted");
    Ok(Json(drafted))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::config::Config;
    use crate::testing::{MockUpstream, post_json, post_raw};

    fn error_of(body: &[u8]) -> String {
        serde_json::from_slice::<Value>(body).unwrap()["error"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn fenced_reply_is_accepted() {
        let mock = MockUpstream::start().await;
        mock.reply_with("```json\n{\"caption\":\"dream pop, hazy\",\"lyrics\":\"[Verse]\\nfloat\"}\n```");

        let (status, _, body) = post_json(
            &mock.app(),
            "/api/lyrics",
            json!({"prompt": "a hazy summer", "lyricsDensity": "light", "duration": 45}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"caption": "dream pop, hazy", "lyrics": "[Verse]\nfloat"}));

        let chats = mock.chats();
        assert_eq!(chats[0]["model"], "grok-4-1-fast-non-reasoning");
        assert_eq!(chats[0]["temperature"], 0.85);
        assert_eq!(chats[0]["messages"][1]["content"], "a hazy summer");
        let system = chats[0]["messages"][0]["content"].as_str().unwrap();
        assert!(system.contains("The song is 45 seconds. Write one verse and a short chorus"));
        assert_eq!(mock.auth_headers()[0], "Bearer test-key");
    }

    #[tokio::test]
    async fn malformed_reply_is_500() {
        let mock = MockUpstream::start().await;
        mock.reply_with("Sure! Here are your lyrics: [Verse] ...");
        let (status, _, body) = post_json(&mock.app(), "/api/lyrics", json!({"prompt": "x"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&body), "Failed to generate lyrics. Please try again.");

        mock.reply_with("{\"caption\": \"only a caption\"}");
        let (status, _, _) = post_json(&mock.app(), "/api/lyrics", json!({"prompt": "x"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn empty_reply_and_model_errors() {
        let mock = MockUpstream::start().await;
        mock.reply_with("");
        let (_, _, body) = post_json(&mock.app(), "/api/lyrics", json!({"prompt": "x"})).await;
        assert_eq!(error_of(&body), "No response from AI");

        mock.reply_error();
        let (status, _, body) = post_json(&mock.app(), "/api/lyrics", json!({"prompt": "x"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&body), "Failed to generate lyrics");
    }

    #[tokio::test]
    async fn prompt_is_required() {
        let mock = MockUpstream::start().await;
        for body in [json!({}), json!({"prompt": ""}), json!({"prompt": 42})] {
            let (status, _, body) = post_json(&mock.app(), "/api/lyrics", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error_of(&body), "prompt is required");
        }
        assert!(mock.chats().is_empty());
    }

    #[tokio::test]
    async fn missing_key_is_reported_first() {
        let mock = MockUpstream::start().await;
        let app = mock.app_with(Config { xai_api_key: None, ..mock.config() });
        let (status, _, body) = post_json(&app, "/api/lyrics", json!({})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_of(&body), "XAI_API_KEY not configured");
    }

    #[tokio::test]
    async fn unparseable_body_is_500() {
        let mock = MockUpstream::start().await;
        for body in ["{not json", ""] {
            let (status, _, body) = post_raw(&mock.app(), "/api/lyrics", body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(error_of(&body), "Failed to generate lyrics. Please try again.");
        }
        assert!(mock.chats().is_empty());
    }
}

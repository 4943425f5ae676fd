//! Clients for the services the proxy fronts.
//!
//! [`ModalClient`] talks to the music inference service and [`XaiClient`] to
//! the OpenAI-compatible lyrics model. Both return [`UpstreamError`]; the
//! route handlers decide which message the caller sees.

pub mod modal;
pub mod xai;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use thiserror::Error;

pub use modal::ModalClient;
pub use xai::XaiClient;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// A 2xx answer that could not be decoded.
    #[error("malformed upstream response: {0}")]
    Decode(String),

    #[error("invalid upstream URL: {0}")]
    Url(String),
}

/// Shared reqwest client for upstream calls.
///
/// Only the connect phase is bounded; inference calls may take minutes.
pub fn http_client() -> Result<Client, UpstreamError> {
    Ok(Client::builder()
        .user_agent(concat!("riff-server/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?)
}

/// Parse a base URL, rejecting forms that cannot carry path segments.
pub(crate) fn parse_base(raw: &str) -> Result<Url, UpstreamError> {
    let url = Url::parse(raw.trim()).map_err(|e| UpstreamError::Url(format!("{raw}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(UpstreamError::Url(format!("{raw}: not a base URL")));
    }
    Ok(url)
}

/// `base` with `segments` appended, each percent-encoded.
pub(crate) fn join(base: &Url, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| UpstreamError::Url(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Pass 2xx responses through; turn anything else into
/// [`UpstreamError::Status`] with the response text.
pub(crate) async fn check(resp: Response) -> Result<Response, UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(UpstreamError::Status { status, body })
}

pub(crate) async fn json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, UpstreamError> {
    let bytes = check(resp).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
}

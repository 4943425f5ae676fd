use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use riff_types::{CancelResponse, SubmitPayload};
use serde_json::Value;
use tracing::debug;

use super::{UpstreamError, check, join, json, parse_base};

/// Client for the music inference service's HTTP API.
#[derive(Debug, Clone)]
pub struct ModalClient {
    client: Client,
    base: Url,
}

impl ModalClient {
    pub fn new(client: Client, base: &str) -> Result<Self, UpstreamError> {
        Ok(Self { client, base: parse_base(base)? })
    }

    /// `POST /queue/submit`; the service's JSON answer is returned untouched.
    pub async fn submit(&self, payload: &SubmitPayload) -> Result<Value, UpstreamError> {
        let url = join(&self.base, &["queue", "submit"])?;
        debug!(%url, duration = payload.duration, task = ?payload.task_type, "submitting job");
        json(self.client.post(url).json(payload).send().await?).await
    }

    /// `GET /queue/status/{job_id}`.
    pub async fn status(&self, job_id: &str) -> Result<Value, UpstreamError> {
        let url = join(&self.base, &["queue", "status", job_id])?;
        json(self.client.get(url).send().await?).await
    }

    /// `GET /queue/cancel/{job_id}`.
    pub async fn cancel(&self, job_id: &str) -> Result<bool, UpstreamError> {
        let url = join(&self.base, &["queue", "cancel", job_id])?;
        let body: CancelResponse = json(self.client.get(url).send().await?).await?;
        Ok(body.cancelled)
    }

    /// `GET /audio/{job_id}[/{index}]`; the checked response is returned so
    /// the body can be streamed.
    pub async fn audio(&self, job_id: &str, index: Option<u32>) -> Result<Response, UpstreamError> {
        let index = index.map(|i| i.to_string());
        let url = match &index {
            Some(i) => join(&self.base, &["audio", job_id, i.as_str()])?,
            None => join(&self.base, &["audio", job_id])?,
        };
        check(self.client.get(url).send().await?).await
    }

    /// `POST /upload_audio` with a single `file` part.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<Value, UpstreamError> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_owned());
        if let Some(ct) = content_type {
            part = part.mime_str(ct)?;
        }
        let url = join(&self.base, &["upload_audio"])?;
        json(self.client.post(url).multipart(Form::new().part("file", part)).send().await?).await
    }

    /// `POST /generate_file`: synchronous generation answered with audio.
    pub async fn generate_file(&self, payload: &SubmitPayload) -> Result<Response, UpstreamError> {
        let url = join(&self.base, &["generate_file"])?;
        check(self.client.post(url).json(payload).send().await?).await
    }
}

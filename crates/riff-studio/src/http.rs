use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use riff_types::{
    CancelResponse, ErrorBody, GenerateParams, JobStatusResponse, LyricsRequest, LyricsResponse,
    SubmitResponse, UploadResponse,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{AudioFile, StudioApi, StudioError};

/// [`StudioApi`] backed by a running riff-server.
#[derive(Debug, Clone)]
pub struct HttpStudioApi {
    client: Client,
    base: Url,
}

impl HttpStudioApi {
    /// `base` is the proxy origin, e.g. `http://127.0.0.1:3000`.
    pub fn new(base: &str) -> Result<Self, StudioError> {
        let client = Client::builder()
            .user_agent(concat!("riff-studio/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, base)
    }

    pub fn with_client(client: Client, base: &str) -> Result<Self, StudioError> {
        let mut base = Url::parse(base).map_err(|e| StudioError::InvalidUrl(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StudioError> {
        self.base.join(path).map_err(|e| StudioError::InvalidUrl(e.to_string()))
    }

    fn job_url(&self, job_id: &str) -> Result<Url, StudioError> {
        let mut url = self.endpoint("api/generate")?;
        url.query_pairs_mut().append_pair("job_id", job_id);
        Ok(url)
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, StudioError> {
        let resp = check(resp).await?;
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| StudioError::Decode(e.to_string()))
    }
}

/// Turn a non-2xx response into [`StudioError::Rejected`] carrying the
/// proxy's `error` message.
async fn check(resp: Response) -> Result<Response, StudioError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| format!("request failed with status {status}"));
    debug!(status = status.as_u16(), %message, "proxy rejected request");
    Err(StudioError::Rejected { status: status.as_u16(), message })
}

impl StudioApi for HttpStudioApi {
    async fn submit(&self, params: &GenerateParams) -> Result<SubmitResponse, StudioError> {
        let url = self.endpoint("api/generate")?;
        let resp = self.client.post(url).json(params).send().await?;
        Self::json(resp).await
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, StudioError> {
        let resp = self.client.get(self.job_url(job_id)?).send().await?;
        Self::json(resp).await
    }

    async fn cancel(&self, job_id: &str) -> Result<bool, StudioError> {
        let mut url = self.job_url(job_id)?;
        url.query_pairs_mut().append_pair("cancel", "1");
        let resp = self.client.get(url).send().await?;
        let body: CancelResponse = Self::json(resp).await?;
        Ok(body.cancelled)
    }

    async fn fetch_audio(&self, job_id: &str, index: Option<u32>) -> Result<AudioFile, StudioError> {
        let mut url = self.endpoint("api/audio")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("job_id", job_id);
            if let Some(index) = index {
                query.append_pair("index", &index.to_string());
            }
        }
        let resp = check(self.client.get(url).send().await?).await?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_owned();
        let bytes = resp.bytes().await?;
        Ok(AudioFile { bytes, content_type })
    }

    async fn write_lyrics(&self, request: &LyricsRequest) -> Result<LyricsResponse, StudioError> {
        let url = self.endpoint("api/lyrics")?;
        let resp = self.client.post(url).json(request).send().await?;
        Self::json(resp).await
    }

    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadResponse, StudioError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(content_type)
            .map_err(|e| StudioError::Failed(format!("invalid content type: {e}")))?;
        let form = Form::new().part("file", part);
        let url = self.endpoint("api/upload")?;
        let resp = self.client.post(url).multipart(form).send().await?;
        Self::json(resp).await
    }
}

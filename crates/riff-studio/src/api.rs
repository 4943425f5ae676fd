//! The studio's view of the proxy endpoints.
//!
//! [`StudioApi`] is the seam between the state machine and the network.
//! [`crate::HttpStudioApi`] talks to a running riff-server; tests substitute
//! an in-memory fake.

use std::future::Future;

use bytes::Bytes;
use riff_types::{
    AudioFormat, GenerateParams, JobStatusResponse, LyricsRequest, LyricsResponse,
    SubmitResponse, UploadResponse,
};

use crate::StudioError;

/// Audio fetched for a completed job.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFile {
    pub bytes: Bytes,
    pub content_type: String,
}

impl AudioFile {
    pub fn format(&self) -> AudioFormat {
        AudioFormat::sniff(Some(&self.content_type))
    }
}

impl std::fmt::Debug for AudioFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFile")
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Client side of `/api/generate`, `/api/audio`, `/api/lyrics` and `/api/upload`.
pub trait StudioApi: Send + Sync {
    /// `POST /api/generate`.
    fn submit(
        &self,
        params: &GenerateParams,
    ) -> impl Future<Output = Result<SubmitResponse, StudioError>> + Send;

    /// `GET /api/generate?job_id=`.
    fn status(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<JobStatusResponse, StudioError>> + Send;

    /// `GET /api/generate?job_id=&cancel=1`; `Ok(true)` if the service
    /// accepted the cancellation.
    fn cancel(&self, job_id: &str) -> impl Future<Output = Result<bool, StudioError>> + Send;

    /// `GET /api/audio?job_id=[&index=]`.
    fn fetch_audio(
        &self,
        job_id: &str,
        index: Option<u32>,
    ) -> impl Future<Output = Result<AudioFile, StudioError>> + Send;

    /// `POST /api/lyrics`.
    fn write_lyrics(
        &self,
        request: &LyricsRequest,
    ) -> impl Future<Output = Result<LyricsResponse, StudioError>> + Send;

    /// `POST /api/upload` with a single `file` part.
    fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> impl Future<Output = Result<UploadResponse, StudioError>> + Send;
}

//! Wire types shared by the riff proxy server and the studio client.
//!
//! Everything here is plain data plus the normalisation rules both sides
//! must agree on (parameter clamps, the instrumental sentinel, title
//! derivation).  There is no I/O in this crate.

pub mod generate;
pub mod job;
pub mod lenient;
pub mod lyrics;
pub mod track;
pub mod upload;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use generate::{
    AudioFormat, GenerateParams, InferMethod, SubmitPayload, SynthesisKnobs, TaskType,
    INSTRUMENTAL, clamp_duration,
};
pub use job::{CancelResponse, JobStatus, JobStatusResponse, SubmitResponse};
pub use lyrics::{Contrast, LyricsDensity, LyricsRequest, LyricsResponse, Variant};
pub use track::{LibraryTrack, TrackDraft, make_title};
pub use upload::{ALLOWED_AUDIO_TYPES, MAX_UPLOAD_BYTES, UploadResponse, is_allowed_audio_type};

/// Uniform error body returned by every proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

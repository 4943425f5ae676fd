use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Largest reference/source audio file accepted for upload.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub const ALLOWED_AUDIO_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/wav",
    "audio/x-wav",
    "audio/flac",
    "audio/mp4",
    "audio/ogg",
    "audio/x-m4a",
    "audio/aac",
];

pub fn is_allowed_audio_type(content_type: &str) -> bool {
    ALLOWED_AUDIO_TYPES.contains(&content_type)
}

/// Storage location of an uploaded file on the inference service; pass it
/// back as `src_audio_path` or `reference_audio_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub path: String,
}

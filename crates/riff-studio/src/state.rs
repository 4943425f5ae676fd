use std::fmt;

use serde_json::Value;

use crate::AudioFile;

/// Screen-level phase of the studio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudioPhase {
    #[default]
    Compose,
    WritingLyrics,
    PreviewLyrics,
    Queued,
    Generating,
    Player,
}

impl fmt::Display for StudioPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StudioPhase::Compose => "compose",
            StudioPhase::WritingLyrics => "writing-lyrics",
            StudioPhase::PreviewLyrics => "preview-lyrics",
            StudioPhase::Queued => "queued",
            StudioPhase::Generating => "generating",
            StudioPhase::Player => "player",
        })
    }
}

/// Status of one track slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotStatus {
    #[default]
    Idle,
    Queued,
    Generating,
    Complete,
    Failed,
}

impl SlotStatus {
    pub fn is_active(self) -> bool {
        matches!(self, SlotStatus::Queued | SlotStatus::Generating)
    }
}

/// Client-side view of one submitted generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackJob {
    pub id: Option<String>,
    pub status: SlotStatus,
    pub position: u32,
    pub audio: Option<AudioFile>,
    /// Audio index to request when the job reported several files.
    pub audio_index: Option<u32>,
    pub error: Option<String>,
    pub saved: bool,
    /// Metadata reported by `extract` jobs instead of audio.
    pub extract_metadata: Option<Value>,
}

impl TrackJob {
    pub fn queued(id: String, position: u32) -> Self {
        Self { id: Some(id), status: SlotStatus::Queued, position, ..Self::default() }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: SlotStatus::Failed, error: Some(error.into()), ..Self::default() }
    }

    /// Complete but still waiting for its audio download.
    pub fn needs_audio(&self) -> bool {
        self.status == SlotStatus::Complete
            && self.id.is_some()
            && self.audio.is_none()
            && self.extract_metadata.is_none()
    }
}

/// Result of one polling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is being polled.
    Idle,
    /// A request failed in transit; state is unchanged.
    Retry,
    /// Jobs are still queued or generating.
    Continue,
    /// Every take completed and its audio is available.
    Finished,
    /// At least one take failed; the rest were cancelled.
    Failed,
}

impl TickOutcome {
    /// `true` once polling has stopped.
    pub fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::Idle | TickOutcome::Finished | TickOutcome::Failed)
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::generate::{DEFAULT_DURATION, GenerateParams, INSTRUMENTAL, SynthesisKnobs};

const TITLE_MAX_CHARS: usize = 60;

/// Editable caption/lyrics pairing shown for review before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDraft {
    pub caption: String,
    pub lyrics: String,
    /// Seconds.
    pub duration: f64,
    pub instrumental: bool,
    pub bpm: Option<u32>,
    pub keyscale: Option<String>,
    pub timesignature: Option<String>,
    pub vocal_language: Option<String>,
    pub seed: Option<i64>,
    #[serde(default)]
    pub knobs: SynthesisKnobs,
}

impl Default for TrackDraft {
    fn default() -> Self {
        Self {
            caption: String::new(),
            lyrics: String::new(),
            duration: DEFAULT_DURATION,
            instrumental: false,
            bpm: None,
            keyscale: None,
            timesignature: None,
            vocal_language: None,
            seed: None,
            knobs: SynthesisKnobs::default(),
        }
    }
}

impl TrackDraft {
    /// Request body for submitting this draft.  Instrumental drafts always
    /// carry the instrumental sentinel as lyrics.
    pub fn to_params(&self) -> GenerateParams {
        self.to_params_with_seed(self.seed)
    }

    pub fn to_params_with_seed(&self, seed: Option<i64>) -> GenerateParams {
        let lyrics = if self.instrumental { INSTRUMENTAL.to_owned() } else { self.lyrics.clone() };
        GenerateParams {
            caption: Some(self.caption.clone()),
            lyrics: Some(lyrics),
            duration: Some(self.duration),
            instrumental: Some(self.instrumental),
            bpm: self.bpm.map(i64::from),
            keyscale: self.keyscale.clone(),
            timesignature: self.timesignature.clone(),
            vocal_language: self.vocal_language.clone(),
            seed,
            knobs: self.knobs.clone(),
        }
    }
}

/// A generated track kept in the local library.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryTrack {
    /// Job id the audio was produced by.
    pub id: String,
    pub title: String,
    pub caption: String,
    pub lyrics: String,
    pub duration: f64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub audio: Vec<u8>,
}

impl fmt::Debug for LibraryTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryTrack")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("duration", &self.duration)
            .field("created_at", &self.created_at)
            .field("audio_bytes", &self.audio.len())
            .finish()
    }
}

/// Library title from a caption: its first sentence, at most 60 characters.
pub fn make_title(caption: &str) -> String {
    let first = caption
        .trim()
        .split(['\n', '.', '!', '?'])
        .next()
        .unwrap_or_default()
        .trim();
    if first.is_empty() {
        return "Untitled".to_owned();
    }
    if first.chars().count() > TITLE_MAX_CHARS {
        let head: String = first.chars().take(TITLE_MAX_CHARS - 3).collect();
        return format!("{head}...");
    }
    first.to_owned()
}

//! Generation request body and the normalised payload forwarded upstream.
//!
//! [`GenerateParams`] is what a caller may send: every field optional.
//! [`SubmitPayload::from_params`] fills defaults and clamps every numeric
//! knob into the range the inference service accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lyrics value that tells the model to produce no vocals.
pub const INSTRUMENTAL: &str = "[Instrumental]";

pub const DEFAULT_CAPTION: &str = "upbeat electronic dance music";
pub const DEFAULT_DURATION: f64 = 30.0;
pub const MIN_DURATION: f64 = 10.0;
/// Upper duration bound accepted by the inference service.
pub const DEFAULT_MAX_DURATION: f64 = 600.0;

/// Clamp a duration into `[MIN_DURATION, max]`.
///
/// A `max` below the minimum is treated as the minimum, and a non-finite
/// duration falls back to [`DEFAULT_DURATION`].
pub fn clamp_duration(duration: f64, max: f64) -> f64 {
    let max = if max.is_finite() { max.max(MIN_DURATION) } else { DEFAULT_MAX_DURATION };
    let duration = if duration.is_finite() { duration } else { DEFAULT_DURATION };
    duration.clamp(MIN_DURATION, max)
}

/// Operation the inference service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Fresh generation from caption and lyrics.
    #[default]
    Text2music,
    /// Re-render `src_audio_path` in a new style.
    Cover,
    /// Regenerate the `repainting_start..repainting_end` window of the source.
    Repaint,
    /// Continue the source audio.
    Extend,
    /// Analyse the source; completes with metadata instead of audio.
    Extract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InferMethod {
    #[default]
    Ode,
    Sde,
}

impl InferMethod {
    /// Anything other than `"sde"` selects the ODE sampler.
    pub fn from_lossy(value: Option<&str>) -> Self {
        match value {
            Some("sde") => InferMethod::Sde,
            _ => InferMethod::Ode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Flac,
}

impl AudioFormat {
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
        }
    }

    /// Guess the format from an upstream `Content-Type`; defaults to mp3.
    pub fn sniff(content_type: Option<&str>) -> Self {
        let ct = content_type.unwrap_or_default().to_ascii_lowercase();
        if ct.contains("wav") {
            AudioFormat::Wav
        } else if ct.contains("flac") {
            AudioFormat::Flac
        } else {
            AudioFormat::Mp3
        }
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            "flac" => Ok(AudioFormat::Flac),
            other => Err(format!("unsupported audio format: {other}")),
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Optional synthesis knobs shared by drafts and generation requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SynthesisKnobs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    /// Storage path returned by the upload endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src_audio_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_audio_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::integer")]
    pub inference_steps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infer_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub shift: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::integer")]
    pub batch_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub repainting_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub repainting_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub audio_cover_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cot_metas: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cot_caption: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cot_language: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub lm_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub lm_cfg_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::integer")]
    pub lm_top_k: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub lm_top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lm_negative_prompt: Option<String>,
}

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GenerateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    /// Seconds; clamped to the configured range.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::number")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumental: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::integer")]
    pub bpm: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyscale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timesignature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vocal_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "crate::lenient::integer_literal")]
    pub seed: Option<i64>,
    #[serde(flatten)]
    pub knobs: SynthesisKnobs,
}

/// Fully-resolved body sent to the inference service's submit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SubmitPayload {
    pub caption: String,
    pub lyrics: String,
    pub duration: f64,
    pub bpm: Option<i64>,
    pub keyscale: Option<String>,
    pub timesignature: Option<String>,
    pub instrumental: bool,
    pub vocal_language: Option<String>,
    pub seed: Option<i64>,
    pub task_type: TaskType,
    pub src_audio_path: Option<String>,
    pub reference_audio_path: Option<String>,
    pub inference_steps: i64,
    pub thinking: bool,
    pub infer_method: InferMethod,
    pub shift: f64,
    pub guidance_scale: f64,
    pub audio_format: AudioFormat,
    pub batch_size: i64,
    pub repainting_start: f64,
    pub repainting_end: f64,
    pub audio_cover_strength: f64,
    pub use_cot_metas: bool,
    pub use_cot_caption: bool,
    pub use_cot_language: bool,
    pub lm_temperature: f64,
    pub lm_cfg_scale: f64,
    pub lm_top_k: i64,
    pub lm_top_p: f64,
    pub lm_negative_prompt: Option<String>,
}

impl SubmitPayload {
    /// Apply defaults and clamps.  `max_duration` is the service's upper
    /// bound for `duration` in seconds.
    pub fn from_params(params: GenerateParams, max_duration: f64) -> Self {
        let instrumental = params.instrumental.unwrap_or(false);
        let lyrics = if instrumental {
            INSTRUMENTAL.to_owned()
        } else {
            non_empty(params.lyrics).unwrap_or_else(|| INSTRUMENTAL.to_owned())
        };
        // A zero duration means "not set", not "as short as possible".
        let duration = params
            .duration
            .filter(|d| d.is_finite() && *d != 0.0)
            .unwrap_or(DEFAULT_DURATION);
        let knobs = params.knobs;

        Self {
            caption: non_empty(params.caption).unwrap_or_else(|| DEFAULT_CAPTION.to_owned()),
            lyrics,
            duration: clamp_duration(duration, max_duration),
            bpm: params.bpm.filter(|b| *b != 0),
            keyscale: non_empty(params.keyscale),
            timesignature: non_empty(params.timesignature),
            instrumental,
            vocal_language: non_empty(params.vocal_language),
            seed: params.seed,
            task_type: knobs.task_type.unwrap_or_default(),
            src_audio_path: non_empty(knobs.src_audio_path),
            reference_audio_path: non_empty(knobs.reference_audio_path),
            inference_steps: clamp_int(knobs.inference_steps, 8, 1, 20),
            thinking: knobs.thinking.unwrap_or(true),
            infer_method: InferMethod::from_lossy(knobs.infer_method.as_deref()),
            shift: clamp_float(knobs.shift, 3.0, 1.0, 5.0),
            guidance_scale: clamp_float(knobs.guidance_scale, 7.0, 1.0, 15.0),
            audio_format: knobs
                .audio_format
                .as_deref()
                .and_then(|f| f.parse().ok())
                .unwrap_or_default(),
            batch_size: clamp_int(knobs.batch_size, 1, 1, 4),
            repainting_start: clamp_float(knobs.repainting_start, 0.0, 0.0, f64::MAX),
            repainting_end: knobs
                .repainting_end
                .filter(|v| v.is_finite())
                .unwrap_or(-1.0),
            audio_cover_strength: clamp_float(knobs.audio_cover_strength, 1.0, 0.0, 1.0),
            use_cot_metas: knobs.use_cot_metas.unwrap_or(true),
            use_cot_caption: knobs.use_cot_caption.unwrap_or(true),
            use_cot_language: knobs.use_cot_language.unwrap_or(true),
            lm_temperature: clamp_float(knobs.lm_temperature, 0.85, 0.0, 2.0),
            lm_cfg_scale: clamp_float(knobs.lm_cfg_scale, 2.0, 1.0, 3.0),
            lm_top_k: clamp_int(knobs.lm_top_k, 0, 0, 100),
            lm_top_p: clamp_float(knobs.lm_top_p, 0.9, 0.0, 1.0),
            lm_negative_prompt: non_empty(knobs.lm_negative_prompt),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn clamp_float(value: Option<f64>, default: f64, min: f64, max: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(default).clamp(min, max)
}

fn clamp_int(value: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    value.unwrap_or(default).clamp(min, max)
}

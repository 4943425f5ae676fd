use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::lenient;

/// How much of the song should carry vocals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LyricsDensity {
    Light,
    #[default]
    Moderate,
    Heavy,
}

impl FromStr for LyricsDensity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(LyricsDensity::Light),
            "moderate" => Ok(LyricsDensity::Moderate),
            "heavy" => Ok(LyricsDensity::Heavy),
            _ => Err(()),
        }
    }
}

/// How far the alternate take should move away from the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Contrast {
    Subtle,
    #[default]
    Balanced,
    Bold,
}

impl FromStr for Contrast {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subtle" => Ok(Contrast::Subtle),
            "balanced" => Ok(Contrast::Balanced),
            "bold" => Ok(Contrast::Bold),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Primary,
    Alternate,
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Variant::Primary),
            "alternate" => Ok(Variant::Alternate),
            _ => Err(()),
        }
    }
}

/// Body of `POST /api/lyrics`.
///
/// Field names are camelCase on the wire.  Values of the wrong JSON type are
/// read as absent; unknown enum values fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LyricsRequest {
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub vibe: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed", skip_serializing_if = "Option::is_none")]
    pub lyrics_density: Option<LyricsDensity>,
    /// Target song length in seconds.
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient::parsed", skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub base_lyrics: Option<String>,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub base_caption: Option<String>,
    #[serde(default, deserialize_with = "lenient::parsed", skip_serializing_if = "Option::is_none")]
    pub contrast: Option<Contrast>,
    /// Language code (`"es"`, `"ja"`, ...) or a free-form language name.
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// `"male"`, `"female"`, or `"auto"`.
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "Option::is_none")]
    pub voice_gender: Option<String>,
}

impl LyricsRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: Some(prompt.into()), ..Self::default() }
    }
}

/// Caption and lyrics drafted by the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LyricsResponse {
    pub caption: String,
    pub lyrics: String,
}

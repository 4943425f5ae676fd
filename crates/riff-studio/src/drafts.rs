//! Composition inputs and the pure helpers that turn them into drafts.

use riff_types::{Contrast, LyricsDensity, LyricsRequest, SynthesisKnobs, TrackDraft, INSTRUMENTAL};

/// Settings shared by the smart and pro composition flows.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOptions {
    /// Seconds.
    pub duration: f64,
    pub instrumental: bool,
    pub vibe: Option<String>,
    pub lyrics_density: LyricsDensity,
    /// Ask the lyrics writer for a distinct second set of lyrics for take B.
    pub alt_lyrics: bool,
    pub contrast: Contrast,
    /// Seed for take A; take B uses `seed + 1`.
    pub seed: Option<i64>,
    pub bpm: Option<u32>,
    pub keyscale: Option<String>,
    pub timesignature: Option<String>,
    /// `None` or `"auto"` lets the model decide.
    pub vocal_language: Option<String>,
    pub language: Option<String>,
    pub voice_gender: Option<String>,
    pub style_tags: Option<String>,
    pub negative_tags: Option<String>,
    pub knobs: SynthesisKnobs,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            duration: riff_types::generate::DEFAULT_DURATION,
            instrumental: false,
            vibe: None,
            lyrics_density: LyricsDensity::default(),
            alt_lyrics: false,
            contrast: Contrast::default(),
            seed: None,
            bpm: None,
            keyscale: None,
            timesignature: None,
            vocal_language: None,
            language: None,
            voice_gender: None,
            style_tags: None,
            negative_tags: None,
            knobs: SynthesisKnobs::default(),
        }
    }
}

impl ComposeOptions {
    /// Seeds for take A and take B.
    pub fn seeds(&self) -> (Option<i64>, Option<i64>) {
        (self.seed, self.seed.map(|s| s.wrapping_add(1)))
    }

    /// A draft carrying these options' musical settings.
    pub fn draft(&self, caption: String, lyrics: String, seed: Option<i64>) -> TrackDraft {
        let lyrics = if self.instrumental { INSTRUMENTAL.to_owned() } else { lyrics };
        TrackDraft {
            caption,
            lyrics,
            duration: self.duration,
            instrumental: self.instrumental,
            bpm: self.bpm.filter(|b| *b > 0),
            keyscale: non_blank(self.keyscale.as_deref()),
            timesignature: non_blank(self.timesignature.as_deref()),
            vocal_language: non_blank(self.vocal_language.as_deref())
                .filter(|l| !l.eq_ignore_ascii_case("auto")),
            seed,
            knobs: self.knobs.clone(),
        }
    }

    /// Lyrics request for the primary take.
    pub fn primary_request(&self, prompt: &str) -> LyricsRequest {
        LyricsRequest {
            vibe: non_blank(self.vibe.as_deref()),
            lyrics_density: Some(self.lyrics_density),
            duration: Some(self.duration),
            language: non_blank(self.language.as_deref()),
            voice_gender: non_blank(self.voice_gender.as_deref()),
            ..LyricsRequest::new(prompt)
        }
    }

    /// Lyrics request for an alternate take derived from `base_caption` and
    /// `base_lyrics`.
    pub fn alternate_request(
        &self,
        prompt: &str,
        base_caption: &str,
        base_lyrics: &str,
    ) -> LyricsRequest {
        LyricsRequest {
            variant: Some(riff_types::Variant::Alternate),
            base_caption: Some(base_caption.to_owned()),
            base_lyrics: Some(base_lyrics.to_owned()),
            contrast: Some(self.contrast),
            ..self.primary_request(prompt)
        }
    }
}

/// Append the contrast instruction that steers take B away from take A.
pub fn contrast_caption(base: &str, contrast: Contrast) -> String {
    let instruction = match contrast {
        Contrast::Subtle => "Alternate take with subtle instrumentation changes and a softer groove.",
        Contrast::Balanced => "Alternate take with different instrumentation, groove, and tempo.",
        Contrast::Bold => "Reimagine in a different genre, tempo, and energy with new instrumentation.",
    };
    format!("{base}\n\n{instruction}")
}

/// Caption with optional style and negative tags appended.
pub fn caption_with_tags(base: &str, style_tags: Option<&str>, negative_tags: Option<&str>) -> String {
    let mut caption = base.trim().to_owned();
    if let Some(tags) = non_blank(style_tags) {
        caption.push_str(" | Style tags: ");
        caption.push_str(&tags);
    }
    if let Some(avoid) = non_blank(negative_tags) {
        caption.push_str(" | Avoid: ");
        caption.push_str(&avoid);
    }
    caption
}

/// Byte range of the `[name]` section in `text`, matched case-insensitively
/// and running until the next line that opens with `[` or the end of text.
fn section_range(text: &str, name: &str) -> Option<(usize, usize)> {
    let marker = format!("[{}]", name.to_ascii_lowercase());
    // ASCII lowercasing keeps byte offsets stable.
    let start = text.to_ascii_lowercase().find(&marker)?;
    let body = start + marker.len();
    let end = text[body..].find("\n[").map_or(text.len(), |i| body + i);
    Some((start, end))
}

/// The `[name]` section of `text`, marker included, trimmed.
pub fn extract_section(text: &str, name: &str) -> Option<String> {
    section_range(text, name).map(|(start, end)| text[start..end].trim().to_owned())
}

/// Replace the `[name]` section of `original` with `replacement`, or append
/// `replacement` when `original` has no such section.
pub fn replace_section(original: &str, name: &str, replacement: &str) -> String {
    match section_range(original, name) {
        Some((start, end)) => {
            format!("{}{}{}", &original[..start], replacement.trim(), &original[end..])
        }
        None => format!("{}\n\n{}", original.trim(), replacement.trim()).trim().to_owned(),
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned)
}

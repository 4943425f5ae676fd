//! System prompts for the lyrics writer.
//!
//! The prompt is assembled from a density instruction (scaled to the target
//! duration), an optional contrast instruction for alternate takes, and
//! optional vibe, language, and voice lines.

use riff_types::{Contrast, LyricsDensity, LyricsRequest, Variant};

pub const MIN_LYRICS_DURATION: f64 = 10.0;
pub const MAX_LYRICS_DURATION: f64 = 120.0;
const DEFAULT_LYRICS_DURATION: f64 = 30.0;

/// Target song length for the lyrics writer, in seconds.
pub fn target_duration(duration: Option<f64>) -> f64 {
    duration
        .filter(|d| d.is_finite() && *d != 0.0)
        .unwrap_or(DEFAULT_LYRICS_DURATION)
        .clamp(MIN_LYRICS_DURATION, MAX_LYRICS_DURATION)
}

/// How much to sing for a song of `dur` seconds.
pub fn density_instruction(density: LyricsDensity, dur: f64) -> String {
    let body = if dur <= 30.0 {
        match density {
            LyricsDensity::Light => "Write minimal lyrics — just one short verse and a brief hook. About 10-15 seconds of vocals, rest instrumental.",
            LyricsDensity::Moderate => "Write one verse and a short chorus. About 15-20 seconds of vocal content.",
            LyricsDensity::Heavy => "Write a verse and full chorus packed with lyrics. About 20-25 seconds of vocal content.",
        }
    } else if dur <= 60.0 {
        match density {
            LyricsDensity::Light => "Write one verse and a short chorus, leaving room for instrumental sections. About 20-30 seconds of vocals.",
            LyricsDensity::Moderate => "Write 2 verses and a full chorus. Good balance of vocals and instrumentals. About 30-40 seconds of vocal content.",
            LyricsDensity::Heavy => "Write 2 verses, a repeated chorus, and a bridge. About 40-50 seconds of vocal content.",
        }
    } else {
        match density {
            LyricsDensity::Light => "Write 2 verses and a chorus with instrumental breaks between sections. About 40-50 seconds of vocals.",
            LyricsDensity::Moderate => "Write 2-3 verses, a repeated chorus, and a bridge. Good balance. About 60-80 seconds of vocal content.",
            LyricsDensity::Heavy => "Write 3 verses, repeated chorus, a bridge, and an outro. Dense vocal content filling most of the song. About 80-100 seconds of vocals.",
        }
    };
    format!("The song is {dur} seconds. {body}")
}

pub fn contrast_instruction(contrast: Contrast) -> &'static str {
    match contrast {
        Contrast::Subtle => "Change 1-2 tags: shift sub-genre or swap one instrument. Keep same mood and energy.",
        Contrast::Balanced => "Change 3-4 tags: different genre approach, different instruments, shift vocal style or tempo.",
        Contrast::Bold => "Change everything: opposite genre, different energy, completely different instrumentation and vocal character.",
    }
}

/// Display name for a language code; unknown values are used as given.
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese (Mandarin)",
        "hi" => "Hindi",
        "pt" => "Portuguese",
        "de" => "German",
        "ar" => "Arabic",
        "it" => "Italian",
        "ru" => "Russian",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "tr" => "Turkish",
        other => other,
    }
}

/// Writing system for languages that are often romanised by mistake.
pub fn script_name(code: &str) -> Option<&'static str> {
    match code {
        "hi" => Some("Devanagari"),
        "zh" => Some("Simplified Chinese characters"),
        "ja" => Some("Japanese (Hiragana/Katakana/Kanji)"),
        "ko" => Some("Hangul"),
        "ar" => Some("Arabic script"),
        "th" => Some("Thai script"),
        "ru" => Some("Cyrillic"),
        _ => None,
    }
}

fn language_instruction(language: Option<&str>, dur: f64) -> String {
    let Some(code) = language.map(str::trim).filter(|l| !l.is_empty()) else {
        return String::new();
    };
    let name = language_name(code);
    if name.eq_ignore_ascii_case("english") {
        return String::new();
    }
    let script = script_name(code)
        .map(|s| format!(" using {s} script — NOT romanized transliteration"))
        .unwrap_or_default();
    format!(
        "\n\nLANGUAGE: Write ALL lyrics in {name}{script}. No English words in lyrics. \
         Lyric length must match {dur}s duration. Caption stays in English but include \"{name} vocals\"."
    )
}

fn voice_instruction(voice_gender: Option<&str>) -> String {
    match voice_gender.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) if !v.eq_ignore_ascii_case("auto") => {
            format!("\n\nVOICE: Caption MUST include \"{v} vocal\". The singer is {v}.")
        }
        _ => String::new(),
    }
}

/// Build the full system prompt for `request`.
pub fn system_prompt(request: &LyricsRequest) -> String {
    let dur = target_duration(request.duration);
    let density = density_instruction(request.lyrics_density.unwrap_or_default(), dur);
    let language = language_instruction(request.language.as_deref(), dur);
    let voice = voice_instruction(request.voice_gender.as_deref());
    let tail = format!("{density}{language}{voice}");

    if request.variant == Some(Variant::Alternate) {
        let contrast = contrast_instruction(request.contrast.unwrap_or_default());
        let base_caption = request
            .base_caption
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or("not provided");
        format!(
            r#"You are a music metadata generator creating an ALTERNATE VERSION of a song.

The alternate must sound DIFFERENT from the original.
{contrast}

ORIGINAL (contrast with this):
Caption: {base_caption}

## CAPTION FORMAT
Short comma-separated tags. 5-8 descriptors, UNDER 200 CHARACTERS total.
Format: genre, mood, instrument, instrument, vocal type, texture

EXAMPLES:
- "synth-pop, euphoric, bright synths, punchy drums, soaring female vocal, polished 80s production"
- "lo-fi hip hop, mellow, warm electric piano, vinyl crackle, smooth male vocal, bedroom aesthetic"
- "indie folk, melancholic, fingerpicked acoustic guitar, soft cello, breathy female vocal, intimate lo-fi"

## LYRICS FORMAT
ONLY use these tags — no modifiers, no custom tags:
[Verse], [Pre-Chorus], [Chorus], [Bridge], [Outro]

CRITICAL RULES:
- ALWAYS start lyrics with [Verse] — NEVER use [Intro] or any instrumental opening
- 6-10 syllables per line, consistent within each section
- CAPS for emphasis: "We ARE the ones"
- (parentheses) for backing vocals: "Rise up (rise up)"
- Blank line between sections

{tail}

Respond in this exact JSON format:
{{
  "caption": "genre, mood, instruments, vocal, texture",
  "lyrics": "[Verse]\nLyrics...\n\n[Chorus]\nChorus..."
}}

Only respond with valid JSON, no markdown."#
        )
    } else {
        let vibe = request
            .vibe
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| {
                format!(
                    "The vibe/mood MUST be \"{v}\". Reflect this in genre choice, instruments, and vocal style."
                )
            })
            .unwrap_or_default();
        format!(
            r#"You are a music metadata generator. Given a user description, generate a caption and lyrics.

## CAPTION FORMAT
Short comma-separated tags. 5-8 descriptors, UNDER 200 CHARACTERS total.
Format: genre, mood, instrument, instrument, vocal type, texture

EXAMPLES:
- "synth-pop, euphoric, bright synths, punchy drums, soaring female vocal, polished 80s production"
- "lo-fi hip hop, mellow, warm electric piano, vinyl crackle, smooth male vocal, bedroom aesthetic"
- "indie folk, melancholic, fingerpicked acoustic guitar, soft cello, breathy female vocal, intimate lo-fi"
- "cinematic orchestral rock, triumphant, soaring strings, thundering drums, powerful male vocal, stadium production"

{vibe}

## LYRICS FORMAT
ONLY use these tags — no modifiers, no custom tags:
[Verse], [Pre-Chorus], [Chorus], [Bridge], [Outro]

CRITICAL RULES:
- ALWAYS start lyrics with [Verse] — NEVER use [Intro] or any instrumental opening
- 6-10 syllables per line, consistent within each section
- CAPS for emphasis: "We ARE the ones"
- (parentheses) for backing vocals: "Rise up (rise up)"
- Blank line between sections
- Lyrics should be personal, emotional, and match the user's description
- If names are mentioned, weave them naturally into the lyrics

{tail}

Respond in this exact JSON format:
{{
  "caption": "genre, mood, instruments, vocal, texture",
  "lyrics": "[Verse]\nLyrics here...\n\n[Chorus]\nChorus here..."
}}

Only respond with valid JSON, no markdown or extra text."#
        )
    }
}

/// Strip markdown code fences from a model reply.
pub fn strip_fences(content: &str) -> String {
    content
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_owned()
}

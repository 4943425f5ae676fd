//! Naming and format detection for audio written to or read from disk.

use std::path::{Path, PathBuf};

use riff_types::AudioFormat;

/// MIME type for an upload, from the file extension.
pub fn content_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/x-m4a",
        "mp4" => "audio/mp4",
        "aac" => "audio/aac",
        _ => return None,
    })
}

/// Container format of stored audio, from its leading bytes.
///
/// Library records keep only the bytes, so this is what names exported files.
pub fn sniff_bytes(bytes: &[u8]) -> AudioFormat {
    if bytes.starts_with(b"RIFF") {
        AudioFormat::Wav
    } else if bytes.starts_with(b"fLaC") {
        AudioFormat::Flac
    } else {
        AudioFormat::Mp3
    }
}

/// `<dir>/<stem>.<ext>` with the stem reduced to filesystem-safe characters.
pub fn audio_path(dir: &Path, stem: &str, format: AudioFormat) -> PathBuf {
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    dir.join(format!("{stem}.{}", format.extension()))
}

//! `riff library`: list and export saved tracks.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{Local, TimeZone};
use riff_library::TrackStore;
use riff_types::LibraryTrack;

use crate::files::{audio_path, sniff_bytes};

pub(crate) async fn list(store: &impl TrackStore) -> anyhow::Result<()> {
    let tracks = store.get_all_tracks().await?;
    if tracks.is_empty() {
        println!("Library is empty.");
        return Ok(());
    }
    for track in &tracks {
        println!("{}", summary_line(track));
    }
    Ok(())
}

pub(crate) async fn export(store: &impl TrackStore, id: &str, out: &Path) -> anyhow::Result<PathBuf> {
    let tracks = store.get_all_tracks().await?;
    let Some(track) = tracks.into_iter().find(|t| t.id == id) else {
        bail!("no track with id {id}");
    };

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("creating {}", out.display()))?;
    let path = audio_path(out, &track.title, sniff_bytes(&track.audio));
    tokio::fs::write(&path, &track.audio)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    println!("{}", path.display());
    Ok(path)
}

fn summary_line(track: &LibraryTrack) -> String {
    let created = Local
        .timestamp_millis_opt(track.created_at)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_owned());
    format!(
        "{created}  {:>4.0}s  {:<24}  {}",
        track.duration, track.id, track.title
    )
}

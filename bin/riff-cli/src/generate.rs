//! `riff generate`: compose, preview, generate and write both takes.

use std::path::Path;

use anyhow::{Context, bail};
use riff_library::TrackStore;
use riff_studio::{HttpStudioApi, POLL_INTERVAL, Studio, TAKES, TickOutcome};
use tracing::{debug, info};

use crate::cli_args::GenerateArgs;
use crate::files::{audio_path, content_type_for};

const TAKE_LABELS: [&str; TAKES] = ["A", "B"];

pub(crate) async fn run<S: TrackStore>(
    mut studio: Studio<HttpStudioApi, S>,
    args: GenerateArgs,
) -> anyhow::Result<()> {
    studio.set_auto_save(!args.no_save);

    // ── 1. Source audio ────────────────────────────────────────────────────────
    let source_path = match &args.source {
        Some(path) => Some(upload(&studio, path).await?),
        None => None,
    };
    let options = args.compose_options(source_path);

    // ── 2. Drafts ──────────────────────────────────────────────────────────────
    if let Some(caption) = &args.caption {
        let lyrics = match &args.lyrics_file {
            Some(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading lyrics from {}", path.display()))?,
            None => args.lyrics.clone().unwrap_or_default(),
        };
        studio.prepare_pro(caption, &lyrics, &options).await?;
    } else {
        let prompt = args.prompt.as_deref().unwrap_or_default();
        eprintln!("Writing lyrics…");
        studio.prepare_smart(prompt, &options).await?;
    }

    if args.rewrite_chorus && !options.instrumental {
        for index in 0..TAKES {
            studio.rewrite_chorus(index, options.contrast).await?;
        }
    }

    for (label, draft) in TAKE_LABELS.iter().zip(studio.drafts()) {
        println!("── Take {label} ──");
        println!("{}", draft.caption);
        if !draft.instrumental {
            println!("\n{}", draft.lyrics);
        }
        println!();
    }

    // ── 3. Generation ──────────────────────────────────────────────────────────
    studio.generate_from_preview().await?;
    let ids: Vec<&str> = studio.jobs().iter().filter_map(|job| job.id.as_deref()).collect();
    eprintln!("Queued {} (Ctrl-C cancels)", ids.join(", "));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            debug!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    match studio.run_until(POLL_INTERVAL, shutdown).await {
        Some(TickOutcome::Finished) => {}
        Some(_) => bail!(studio.error().unwrap_or("Generation failed").to_owned()),
        None => bail!("generation cancelled"),
    }

    // ── 4. Output ──────────────────────────────────────────────────────────────
    tokio::fs::create_dir_all(&args.out)
        .await
        .with_context(|| format!("creating {}", args.out.display()))?;

    for (label, job) in TAKE_LABELS.iter().zip(studio.jobs()) {
        let (Some(id), Some(audio)) = (job.id.as_deref(), job.audio.as_ref()) else {
            if let Some(metadata) = &job.extract_metadata {
                println!("Take {label}: {metadata}");
            }
            continue;
        };
        let path = audio_path(&args.out, &format!("riff_{id}_{label}"), audio.format());
        tokio::fs::write(&path, &audio.bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        let saved = if job.saved { " (saved to library)" } else { "" };
        println!("Take {label}: {}{saved}", path.display());
    }
    info!("generation finished");
    Ok(())
}

async fn upload<S: TrackStore>(
    studio: &Studio<HttpStudioApi, S>,
    path: &Path,
) -> anyhow::Result<String> {
    let Some(content_type) = content_type_for(path) else {
        bail!("{}: not a supported audio file", path.display());
    };
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("source")
        .to_owned();

    eprintln!("Uploading {file_name}…");
    let stored = studio.upload_source(&file_name, content_type, bytes).await?;
    debug!(%stored, "source uploaded");
    Ok(stored)
}

//! Command handlers for the CLI.

use anyhow::{Context, Result};
use redact_models::{format_seconds, is_critical, ClipId, Detection, DetectionKey, Transcript};
use tokio::sync::watch;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::WorkerConfig;
use crate::editor::{ModeChange, TimelineEditor};
use crate::export::{export_timeline, ExportRequest};
use crate::store::TimelineStore;

/// Run one parsed command against the configured store.
pub async fn handle(cli: Cli, mut config: WorkerConfig) -> Result<()> {
    if let Some(dir) = cli.store_dir {
        config = config.with_store_dir(dir);
    }
    if let Some(dir) = cli.output_dir {
        config = config.with_output_dir(dir);
    }

    let store = TimelineStore::open(&config.store_dir)
        .await
        .with_context(|| format!("opening store at {}", config.store_dir.display()))?;
    let editor = TimelineEditor::new(store.clone(), &config.redaction);

    match cli.command {
        Commands::Add { media, offset } => {
            let item = editor.add_media(&media, offset).await?;
            println!("{}", item.id);
        }

        Commands::List => {
            for item in store.list_items().await? {
                let muted = item.clips.iter().filter(|c| c.muted).count();
                println!(
                    "{}  at {}  {:.3}s  {} clips ({} muted)",
                    item.id,
                    format_seconds(item.start_time),
                    item.duration,
                    item.clips.len(),
                    muted
                );
            }
        }

        Commands::Show { item } => {
            let item = store.get_item(&item).await?;
            for clip in &item.clips {
                let mode = clip
                    .redaction_mode
                    .map(|m| m.as_str())
                    .unwrap_or("default");
                println!(
                    "{}  {} - {}  {}  {}",
                    clip.id,
                    format_seconds(clip.start_time),
                    format_seconds(clip.end_time),
                    if clip.muted { "muted" } else { "open" },
                    mode
                );
            }
        }

        Commands::Remove { item } => {
            store.delete_item(&item).await?;
            info!(item_id = %item, "Removed timeline item");
        }

        Commands::Redact { item, range, mode } => {
            let outcome = editor.redact(&item, range, mode).await?;
            if outcome.is_noop() {
                println!("already redacted");
            } else {
                println!("muted {} new range(s)", outcome.applied.len());
            }
        }

        Commands::Unredact { item, range } => {
            let changed = editor.unredact(&item, range).await?;
            println!("{}", if changed { "unmuted" } else { "nothing to unmute" });
        }

        Commands::Clear { item, clip } => {
            let cleared = editor.clear(&item, clip.map(ClipId::from_string)).await?;
            println!("unmuted {} clip(s)", cleared);
        }

        Commands::Transcript { item, file } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let transcript: Transcript = serde_json::from_slice(&bytes)?;
            let words = editor.attach_transcript(&item, transcript).await?;
            println!("attached transcript with {} words", words);
        }

        Commands::Word { item, index } => {
            let outcome = editor.toggle_word(&item, index).await?;
            println!("{:?}", outcome);
        }

        Commands::Detections { item, file, auto } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let detections: Vec<Detection> = serde_json::from_slice(&bytes)?;
            let count = detections.len();
            let outcome = editor
                .add_detections(&item, detections, auto, is_critical)
                .await?;
            println!(
                "stored {} detection(s), muted {} new range(s)",
                count,
                outcome.applied.len()
            );
        }

        Commands::Phrase {
            item,
            text,
            category,
            apply,
        } => {
            let found = editor.add_phrase(&item, &text, &category, apply).await?;
            for detection in &found {
                println!("{}", detection.key());
            }
        }

        Commands::ToggleDetection { item, key } => {
            let key = DetectionKey::from_string(key);
            let outcome = editor.toggle_detection(&item, &key).await?;
            println!("{:?}", outcome);
        }

        Commands::Mode { item, clip, set } => {
            let change = match set {
                Some(mode) => ModeChange::Set(mode.as_override()),
                None => ModeChange::Toggle,
            };
            let mode = editor
                .change_mode(&item, &ClipId::from_string(clip), change)
                .await?;
            println!("{}", mode.map(|m| m.as_str()).unwrap_or("default"));
        }

        Commands::Stats { item } => {
            let stats = editor.stats(&item).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Export { out, sample_rate } => {
            let (cancel_tx, cancel_rx) = watch::channel(false);
            let ctrl_c = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received shutdown signal, cancelling export");
                    let _ = cancel_tx.send(true);
                }
            });

            let request = ExportRequest { out, sample_rate };
            let result = export_timeline(&store, &config, request, Some(cancel_rx)).await;
            ctrl_c.abort();

            let summary = result?;
            println!("{}", summary.path.display());
        }
    }

    Ok(())
}

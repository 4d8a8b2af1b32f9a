//! Whole-timeline export.
//!
//! Snapshots every stored item, decodes each referenced source once, and
//! renders on the blocking pool so the runtime stays responsive.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use redact_media::{
    ClipPartition, RenderContext, RenderEngine, RenderItem, RenderReport, SourceAudio,
};
use redact_models::MediaId;
use serde::Serialize;
use tokio::sync::watch;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::OperationLogger;
use crate::store::TimelineStore;

/// Overrides for one export.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Output file; defaults to a timestamped file in the output directory.
    pub out: Option<PathBuf>,
    /// Render rate; overrides the configured rate.
    pub sample_rate: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub items: usize,
    pub sample_rate: u32,
    pub report: RenderReport,
}

/// Render every stored item into one WAV file.
pub async fn export_timeline(
    store: &TimelineStore,
    config: &WorkerConfig,
    request: ExportRequest,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> WorkerResult<ExportSummary> {
    let export_id = format!("export_{}", Utc::now().format("%Y%m%d_%H%M%S"));
    let logger = OperationLogger::new(export_id.as_str(), "export");
    let result = run_export(store, config, request, cancel_rx, &export_id, &logger)
        .instrument(logger.create_span())
        .await;

    match &result {
        Ok(summary) => {
            metrics::counter!("redact_exports_total", "status" => "success").increment(1);
            logger.log_completion(&format!(
                "{} items, {} frames -> {}",
                summary.items,
                summary.report.frames,
                summary.path.display()
            ));
        }
        Err(e) => {
            metrics::counter!("redact_exports_total", "status" => "failure").increment(1);
            logger.log_error(&e.to_string());
        }
    }
    result
}

async fn run_export(
    store: &TimelineStore,
    config: &WorkerConfig,
    request: ExportRequest,
    cancel_rx: Option<watch::Receiver<bool>>,
    export_id: &str,
    logger: &OperationLogger,
) -> WorkerResult<ExportSummary> {
    let items = store.list_items().await?;
    if items.is_empty() {
        return Err(WorkerError::invalid_input("timeline has no items"));
    }
    logger.log_start(&format!("{} items", items.len()));

    let mut sources: HashMap<MediaId, Arc<SourceAudio>> = HashMap::new();
    let mut render_items = Vec::with_capacity(items.len());
    let mut first_rate = None;

    for item in &items {
        let partition = ClipPartition::from_item(item)?;

        let source = match sources.get(&item.media_id) {
            Some(source) => source.clone(),
            None => {
                let media = store.get_media(&item.media_id).await?;
                let path = media.path.clone();
                let source = tokio::task::spawn_blocking(move || SourceAudio::load(path))
                    .await
                    .map_err(|e| WorkerError::export_failed(format!("decode task failed: {}", e)))??;
                logger.log_progress(&format!(
                    "decoded {} ({} frames)",
                    media.path.display(),
                    source.frames()
                ));
                let source = Arc::new(source);
                sources.insert(item.media_id.clone(), source.clone());
                source
            }
        };

        first_rate.get_or_insert(source.sample_rate());
        render_items.push(RenderItem::new(item.start_time, partition.snapshot(), source));
    }

    let sample_rate = request
        .sample_rate
        .or(config.sample_rate)
        .or(first_rate)
        .ok_or_else(|| WorkerError::config_error("no sample rate available"))?;

    let path = match request.out {
        Some(path) => path,
        None => config.output_dir.join(format!("{}.wav", export_id)),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let context = RenderContext::new(sample_rate, &config.redaction);
    let mut engine = RenderEngine::new(context);
    if let Some(rx) = cancel_rx {
        engine = engine.with_cancel(rx);
    }

    let out = path.clone();
    let report = tokio::task::spawn_blocking(move || engine.export(&render_items, &out))
        .await
        .map_err(|e| WorkerError::export_failed(format!("render task failed: {}", e)))??;

    if report.samples_skipped > 0 {
        logger.log_warning(&format!(
            "{} samples fell outside their source and were skipped",
            report.samples_skipped
        ));
    }

    Ok(ExportSummary {
        path,
        items: items.len(),
        sample_rate,
        report,
    })
}

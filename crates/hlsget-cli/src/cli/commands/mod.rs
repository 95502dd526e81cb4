//! CLI command handlers.

mod batch;
mod config;
mod get;

pub use batch::run_batch;
pub use config::run_show_config;
pub use get::run_get;

use anyhow::{Context, Result};
use hlsget_core::config::HlsgetConfig;
use hlsget_core::progress::ProgressCounters;
use hlsget_core::{DownloadError, DownloaderBuilder, RunReport};
use std::path::Path;
use std::sync::Arc;

use super::progress::spawn_ticker;

/// Runs one download on the blocking pool. Ctrl-C sets the abort token; the
/// run then stops after in-flight segments and reports `Aborted`.
pub(super) async fn download_one(
    cfg: &HlsgetConfig,
    url: &str,
    name: Option<String>,
    show_progress: bool,
) -> Result<RunReport> {
    let progress = Arc::new(ProgressCounters::new());
    let mut builder = DownloaderBuilder::new(url)
        .config(cfg)
        .progress(progress.clone());
    if let Some(name) = name {
        builder = builder.save_name(name);
    }
    let downloader = builder
        .build()
        .with_context(|| format!("invalid settings for {url}"))?;
    let abort = downloader.abort_token();
    let segments_dir = downloader.download_dir().to_path_buf();
    tracing::debug!(
        save_name = downloader.save_name(),
        segments_dir = %downloader.download_dir().display(),
        "starting"
    );

    let ticker = show_progress.then(|| spawn_ticker(Arc::clone(&progress)));
    let mut task = tokio::task::spawn_blocking(move || downloader.run());
    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted; waiting for in-flight segments");
            eprintln!("\ninterrupted, finishing in-flight segments...");
            abort.abort();
            task.await
        }
    };
    if let Some(ticker) = ticker {
        // A panicked run never signals finish.
        if joined.is_err() {
            ticker.abort();
        }
        let _ = ticker.await;
    }

    let result: Result<RunReport, DownloadError> = joined.context("download task panicked")?;
    match result {
        Ok(report) => Ok(report),
        Err(e) => {
            let context = failure_context(url, &segments_dir, &e);
            Err(anyhow::Error::new(e).context(context))
        }
    }
}

/// Resumable failures point at the kept segments.
fn failure_context(url: &str, segments_dir: &Path, err: &DownloadError) -> String {
    if err.is_resumable() {
        format!(
            "downloading {url} (segments kept in {}; rerun to resume)",
            segments_dir.display()
        )
    } else {
        format!("downloading {url}")
    }
}

/// True if `err` came from an aborted run.
pub(super) fn is_aborted(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<DownloadError>(),
        Some(DownloadError::Aborted)
    )
}

pub(super) fn print_report(report: &RunReport) {
    println!(
        "{}: {} segment(s), {} fetched, {} reused, {} attempt(s) -> {}",
        report.save_name,
        report.total_segments,
        report.fetched,
        report.reused,
        report.attempts,
        report.output_path.display()
    );
}

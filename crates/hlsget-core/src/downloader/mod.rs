//! Download orchestrator.
//!
//! One [`Downloader`] handles one manifest URL. [`Downloader::run`] walks the
//! phases in order: prepare directories, fetch and parse the manifest, run
//! download attempts until every segment file is on disk, merge them into the
//! output, and remove the segment directory. A failed or aborted run leaves
//! its segment files behind, so running again with the same settings resumes.

mod attempt;
mod builder;
mod fetch;
mod phase;
mod pool;

pub use attempt::{AttemptResult, LoopSummary};
pub use builder::{DownloaderBuilder, DEFAULT_THREADS};
pub use fetch::{FetchOutcome, SegmentFetcher};
pub use phase::Phase;
pub use pool::{BatchReport, WorkerPool};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use attempt::DownloadLoop;
use phase::PhaseTracker;

use crate::control::AbortToken;
use crate::error::{error_chain, DownloadError};
use crate::http::{fetch_ok, HttpClient, RequestBuilder};
use crate::playlist::{parse_manifest, Manifest, SegmentSelector};
use crate::progress::ProgressSink;
use crate::retry::{run_with_retry, RetryError, RetryPolicy};
use crate::segment::{plan_segments, SegmentNaming};
use crate::storage;
use crate::url_model::{validate_source, UrlResolver};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub save_name: String,
    pub output_path: PathBuf,
    pub total_segments: usize,
    /// Download attempts used (1 when nothing needed a retry).
    pub attempts: u32,
    /// Segments downloaded by this run.
    pub fetched: usize,
    /// Segments found on disk from an earlier run.
    pub reused: usize,
    pub bytes_fetched: u64,
    pub output_bytes: u64,
    pub debris_removed: bool,
}

pub struct Downloader {
    source_url: String,
    save_name: String,
    download_dir: PathBuf,
    output_dir: PathBuf,
    output_path: PathBuf,
    pool: WorkerPool,
    manifest_retry: RetryPolicy,
    clear_debris: bool,
    naming: SegmentNaming,
    selector: Arc<dyn SegmentSelector>,
    resolver: Arc<dyn UrlResolver>,
    requests: Arc<dyn RequestBuilder>,
    client: Arc<dyn HttpClient>,
    progress: Arc<dyn ProgressSink>,
    abort: AbortToken,
}

impl Downloader {
    pub fn builder(source_url: impl Into<String>) -> DownloaderBuilder {
        DownloaderBuilder::new(source_url)
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn save_name(&self) -> &str {
        &self.save_name
    }

    /// Directory holding this run's segment files.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn concurrency_limit(&self) -> usize {
        self.pool.limit()
    }

    /// Manifest fetch attempts and download attempts share this cap.
    pub fn max_attempts(&self) -> u32 {
        self.manifest_retry.max_attempts()
    }

    /// Clone of the token this run checks; aborting it stops the run.
    pub fn abort_token(&self) -> AbortToken {
        self.abort.clone()
    }

    /// Runs every phase to completion. Blocking; call from a worker thread
    /// inside async code.
    pub fn run(&self) -> Result<RunReport, DownloadError> {
        tracing::info!(url = %self.source_url, save_name = %self.save_name, "download started");
        let mut phase = PhaseTracker::new();
        let result = self.run_phases(&mut phase);
        self.progress.on_finished();
        match &result {
            Ok(report) => tracing::info!(
                output = %report.output_path.display(),
                segments = report.total_segments,
                fetched = report.fetched,
                reused = report.reused,
                attempts = report.attempts,
                "download finished"
            ),
            Err(e) => {
                tracing::error!(phase = %phase.current(), url = %self.source_url, "download failed: {e}");
                phase.advance(Phase::Failed);
            }
        }
        result
    }

    fn check_abort(&self) -> Result<(), DownloadError> {
        if self.abort.is_aborted() {
            return Err(DownloadError::Aborted);
        }
        Ok(())
    }

    fn run_phases(&self, phase: &mut PhaseTracker) -> Result<RunReport, DownloadError> {
        self.prepare()?;
        self.check_abort()?;

        phase.advance(Phase::Parsing);
        let manifest = self.load_manifest()?;
        if manifest.encrypted {
            return Err(DownloadError::UnsupportedEncryption {
                url: self.source_url.clone(),
            });
        }
        let segments = plan_segments(
            &manifest,
            self.resolver.as_ref(),
            &self.naming,
            &self.download_dir,
        )?;
        tracing::debug!(segments = segments.len(), "manifest parsed");
        self.check_abort()?;

        phase.advance(Phase::Downloading);
        let fetcher = SegmentFetcher::new(
            Arc::clone(&self.client),
            Arc::clone(&self.requests),
            Arc::clone(&self.progress),
        );
        let summary = DownloadLoop {
            segments: &segments,
            dir: &self.download_dir,
            naming: &self.naming,
            pool: &self.pool,
            fetcher: &fetcher,
            progress: &self.progress,
            abort: &self.abort,
            max_attempts: self.manifest_retry.max_attempts(),
        }
        .run()?;
        self.check_abort()?;

        phase.advance(Phase::Merging);
        let output_bytes = storage::merge_segments(
            &self.download_dir,
            &self.naming,
            segments.len(),
            &self.output_path,
        )?;
        tracing::debug!(bytes = output_bytes, output = %self.output_path.display(), "merged");

        phase.advance(Phase::Cleaning);
        let debris_removed = self.clear_debris && self.remove_debris();

        phase.advance(Phase::Done);
        Ok(RunReport {
            save_name: self.save_name.clone(),
            output_path: self.output_path.clone(),
            total_segments: segments.len(),
            attempts: summary.attempts,
            fetched: summary.fetched,
            reused: summary.reused,
            bytes_fetched: summary.bytes_fetched,
            output_bytes,
            debris_removed,
        })
    }

    fn prepare(&self) -> Result<(), DownloadError> {
        validate_source(&self.source_url)?;
        for dir in [&self.download_dir, &self.output_dir] {
            std::fs::create_dir_all(dir).map_err(|source| DownloadError::WorkDirFailed {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Fetches with the manifest retry policy, then parses. Only fetch
    /// failures are retried.
    fn load_manifest(&self) -> Result<Manifest, DownloadError> {
        let body = run_with_retry(&self.manifest_retry, &self.abort, |attempt| {
            tracing::debug!(attempt, url = %self.source_url, "fetching manifest");
            fetch_ok(self.client.as_ref(), self.requests.as_ref(), &self.source_url)
        })
        .map_err(|e| match e {
            RetryError::Aborted => DownloadError::Aborted,
            RetryError::Exhausted { attempts, last } => DownloadError::ManifestFetchFailed {
                url: self.source_url.clone(),
                attempts,
                source: last,
            },
        })?;
        let text = String::from_utf8_lossy(&body);
        parse_manifest(&text, &self.source_url, self.selector.as_ref())
    }

    fn remove_debris(&self) -> bool {
        clear_debris(&self.download_dir)
    }
}

/// Removes a finished run's segment directory. Failure is logged, never
/// returned: the merged output already exists.
fn clear_debris(dir: &Path) -> bool {
    match storage::remove_debris(dir) {
        Ok(()) => true,
        Err(source) => {
            let e = DownloadError::CleanupIoFailed {
                path: dir.to_path_buf(),
                source,
            };
            tracing::warn!("{}", error_chain(&e));
            false
        }
    }
}

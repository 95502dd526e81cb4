//! The download loop: scan, fetch what is missing, rescan, repeat.

use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::fetch::{FetchOutcome, SegmentFetcher};
use super::pool::WorkerPool;
use crate::control::AbortToken;
use crate::error::{error_chain, DownloadError};
use crate::progress::ProgressSink;
use crate::segment::{Segment, SegmentNaming};
use crate::storage;

/// Outcome of one pass over the missing set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    /// 1-based.
    pub attempt: u32,
    pub missing_before: Vec<usize>,
    pub missing_after: Vec<usize>,
}

impl AttemptResult {
    pub fn is_complete(&self) -> bool {
        self.missing_after.is_empty()
    }
}

/// Totals over every attempt of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub attempts: u32,
    /// Segments on disk before the first attempt.
    pub reused: usize,
    pub fetched: usize,
    pub bytes_fetched: u64,
}

pub(crate) struct DownloadLoop<'a> {
    pub segments: &'a [Segment],
    pub dir: &'a Path,
    pub naming: &'a SegmentNaming,
    pub pool: &'a WorkerPool,
    pub fetcher: &'a SegmentFetcher,
    pub progress: &'a Arc<dyn ProgressSink>,
    pub abort: &'a AbortToken,
    pub max_attempts: u32,
}

impl DownloadLoop<'_> {
    fn missing(&self) -> Result<Vec<usize>, DownloadError> {
        let done = storage::scan_completed(self.dir, self.naming).map_err(|source| {
            DownloadError::WorkDirFailed {
                path: self.dir.to_path_buf(),
                source,
            }
        })?;
        Ok(storage::missing_indices(self.segments.len(), &done))
    }

    /// Runs attempts until the directory holds every segment or the cap is hit.
    pub(crate) fn run(&self) -> Result<LoopSummary, DownloadError> {
        let total = self.segments.len();
        let fetched = AtomicUsize::new(0);
        let bytes = AtomicU64::new(0);
        let mut summary = LoopSummary::default();

        for attempt in 1..=self.max_attempts {
            if self.abort.is_aborted() {
                return Err(DownloadError::Aborted);
            }
            let result = self.run_attempt(attempt, &fetched, &bytes)?;
            if attempt == 1 {
                summary.reused = total - result.missing_before.len();
            }
            summary.attempts = attempt;
            tracing::info!(
                attempt,
                max_attempts = self.max_attempts,
                missing_before = result.missing_before.len(),
                missing_after = result.missing_after.len(),
                "download attempt finished"
            );
            if result.is_complete() {
                summary.fetched = fetched.into_inner();
                summary.bytes_fetched = bytes.into_inner();
                return Ok(summary);
            }
            if self.abort.is_aborted() {
                return Err(DownloadError::Aborted);
            }
        }

        let missing = self.missing()?.len();
        Err(DownloadError::RetryExhausted {
            attempts: self.max_attempts,
            missing,
        })
    }

    fn run_attempt(
        &self,
        attempt: u32,
        fetched: &AtomicUsize,
        bytes: &AtomicU64,
    ) -> Result<AttemptResult, DownloadError> {
        let missing_before = self.missing()?;
        let total = self.segments.len();
        self.progress
            .on_baseline_set(total - missing_before.len(), total);

        if !missing_before.is_empty() {
            let tasks: Vec<&Segment> = missing_before.iter().map(|&i| &self.segments[i]).collect();
            let report = self.pool.run_batch(tasks, self.abort, |segment: &Segment| {
                match self.fetcher.fetch(segment) {
                    Ok(FetchOutcome::Fetched { bytes: n }) => {
                        fetched.fetch_add(1, Ordering::Relaxed);
                        bytes.fetch_add(n, Ordering::Relaxed);
                    }
                    Ok(FetchOutcome::Skipped) => {}
                    Err(e) => tracing::warn!(index = segment.index, "{}", error_chain(&e)),
                }
            });
            if report.panicked > 0 || report.skipped > 0 {
                tracing::warn!(
                    attempt,
                    panicked = report.panicked,
                    skipped = report.skipped,
                    "attempt ended with unfinished tasks"
                );
            }
        }

        let missing_after = self.missing()?;
        Ok(AttemptResult {
            attempt,
            missing_before,
            missing_after,
        })
    }
}

//! Progress reporting for a download run.
//!
//! The orchestrator pushes three kinds of signal into a [`ProgressSink`]; it
//! never blocks on the sink. [`ProgressCounters`] keeps atomic aggregates that a
//! renderer can poll on its own schedule and turn into rate/ETA figures.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Receiver of progress signals. Called from worker threads.
pub trait ProgressSink: Send + Sync {
    /// Start of an attempt: `done` segments are already on disk out of `total`.
    fn on_baseline_set(&self, done: usize, total: usize);
    /// One segment was downloaded and written (`bytes` long).
    fn on_segment_completed(&self, bytes: u64);
    /// The run ended, successfully or not.
    fn on_finished(&self);
}

/// Discards every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn on_baseline_set(&self, _done: usize, _total: usize) {}
    fn on_segment_completed(&self, _bytes: u64) {}
    fn on_finished(&self) {}
}

/// Lock-free counters behind a [`ProgressSink`].
#[derive(Debug)]
pub struct ProgressCounters {
    total: AtomicUsize,
    baseline: AtomicUsize,
    done: AtomicUsize,
    bytes: AtomicU64,
    attempts: AtomicUsize,
    finished: AtomicBool,
    // Reset on every baseline so rate/ETA reflect the current attempt.
    started: Mutex<Instant>,
}

impl Default for ProgressCounters {
    fn default() -> Self {
        Self {
            total: AtomicUsize::new(0),
            baseline: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
            attempts: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
            started: Mutex::new(Instant::now()),
        }
    }
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressStats {
        let started = *self
            .started
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        ProgressStats {
            segments_done: self.done.load(Ordering::Relaxed),
            segment_count: self.total.load(Ordering::Relaxed),
            baseline: self.baseline.load(Ordering::Relaxed),
            bytes_done: self.bytes.load(Ordering::Relaxed),
            attempts: self.attempts.load(Ordering::Relaxed),
            elapsed_secs: started.elapsed().as_secs_f64(),
            finished: self.finished.load(Ordering::Relaxed),
        }
    }
}

impl ProgressSink for ProgressCounters {
    fn on_baseline_set(&self, done: usize, total: usize) {
        let done = done.min(total);
        self.total.store(total, Ordering::Relaxed);
        self.baseline.store(done, Ordering::Relaxed);
        self.done.store(done, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.attempts.fetch_add(1, Ordering::Relaxed);
        *self
            .started
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Instant::now();
    }

    fn on_segment_completed(&self, bytes: u64) {
        let total = self.total.load(Ordering::Relaxed);
        // Clamp: a stray completion must never push done past total.
        let _ = self
            .done
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| {
                (d < total).then_some(d + 1)
            });
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_finished(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }
}

/// Point-in-time view of [`ProgressCounters`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    pub segments_done: usize,
    pub segment_count: usize,
    /// Segments already present when the current attempt started.
    pub baseline: usize,
    /// Bytes downloaded during the current attempt.
    pub bytes_done: u64,
    /// Attempts started so far.
    pub attempts: usize,
    /// Seconds since the current attempt started.
    pub elapsed_secs: f64,
    pub finished: bool,
}

impl ProgressStats {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.segment_count == 0 {
            return 0.0;
        }
        (self.segments_done as f64 / self.segment_count as f64).min(1.0)
    }

    /// Transfer rate in bytes per second (0 if elapsed is 0).
    pub fn bytes_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining, extrapolated from segments completed in
    /// this attempt. `None` until at least one segment has landed.
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.segment_count.saturating_sub(self.segments_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let progressed = self.segments_done.saturating_sub(self.baseline);
        if progressed == 0 {
            return None;
        }
        Some(self.elapsed_secs * remaining as f64 / progressed as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(done: usize, count: usize, baseline: usize, bytes: u64, elapsed: f64) -> ProgressStats {
        ProgressStats {
            segments_done: done,
            segment_count: count,
            baseline,
            bytes_done: bytes,
            attempts: 1,
            elapsed_secs: elapsed,
            finished: false,
        }
    }

    #[test]
    fn counters_track_baseline_and_completions() {
        let c = ProgressCounters::new();
        c.on_baseline_set(3, 10);
        c.on_segment_completed(100);
        c.on_segment_completed(50);
        let s = c.snapshot();
        assert_eq!(s.segment_count, 10);
        assert_eq!(s.baseline, 3);
        assert_eq!(s.segments_done, 5);
        assert_eq!(s.bytes_done, 150);
        assert_eq!(s.attempts, 1);
        assert!(!s.finished);
        c.on_finished();
        assert!(c.snapshot().finished);
    }

    #[test]
    fn new_baseline_resets_attempt_counters() {
        let c = ProgressCounters::new();
        c.on_baseline_set(0, 4);
        c.on_segment_completed(10);
        c.on_baseline_set(3, 4);
        let s = c.snapshot();
        assert_eq!(s.segments_done, 3);
        assert_eq!(s.bytes_done, 0);
        assert_eq!(s.attempts, 2);
    }

    #[test]
    fn done_never_exceeds_total() {
        let c = ProgressCounters::new();
        c.on_baseline_set(9, 5);
        assert_eq!(c.snapshot().segments_done, 5);
        c.on_segment_completed(1);
        assert_eq!(c.snapshot().segments_done, 5);
    }

    #[test]
    fn fraction_rate_eta() {
        let s = stats(6, 10, 2, 4000, 2.0);
        assert!((s.fraction() - 0.6).abs() < 1e-9);
        assert!((s.bytes_per_sec() - 2000.0).abs() < 1e-9);
        // 4 segments in 2s, 4 remaining -> 2s.
        assert!((s.eta_secs().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn eta_unknown_without_progress_and_zero_when_done() {
        assert_eq!(stats(2, 10, 2, 0, 5.0).eta_secs(), None);
        assert_eq!(stats(10, 10, 2, 0, 5.0).eta_secs(), Some(0.0));
        assert_eq!(stats(0, 0, 0, 0, 0.0).fraction(), 0.0);
        assert_eq!(stats(0, 10, 0, 10, 0.0).bytes_per_sec(), 0.0);
    }
}

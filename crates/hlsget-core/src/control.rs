//! Run control: a shared abort token for stopping a download early.
//!
//! The CLI sets the token on Ctrl-C; the orchestrator checks it between
//! phases and attempts, and the worker pool stops taking new segments. Files
//! already written stay on disk, so the next run resumes from them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Granularity of abortable sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Cloneable abort flag; all clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    flag: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. Idempotent.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Sleeps for `duration` unless aborted first. Returns `false` if the
    /// sleep was cut short by an abort.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_aborted() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(SLEEP_SLICE.min(deadline - now));
        }
    }
}

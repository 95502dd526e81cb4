//! Bounded worker pool: at most `limit` tasks in flight on scoped OS threads.
//!
//! Workers pull from a shared queue until it is empty. Tasks may borrow from
//! the caller's stack; `run_batch` returns only after every worker joined.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::control::AbortToken;
use crate::error::DownloadError;

/// What happened to the tasks handed to one [`WorkerPool::run_batch`] call.
/// `completed + panicked + skipped` always equals the number of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: usize,
    pub panicked: usize,
    /// Left in the queue because the abort token fired.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    limit: usize,
}

impl WorkerPool {
    pub fn new(limit: usize) -> Result<Self, DownloadError> {
        if limit == 0 {
            return Err(DownloadError::InvalidConfig(
                "concurrency limit must be at least 1".into(),
            ));
        }
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `job` once per task with at most `limit` running concurrently.
    pub fn run_batch<T, F>(&self, tasks: Vec<T>, abort: &AbortToken, job: F) -> BatchReport
    where
        T: Send,
        F: Fn(T) + Sync,
    {
        let total = tasks.len();
        if total == 0 {
            return BatchReport::default();
        }
        let queue = Mutex::new(tasks.into_iter().collect::<VecDeque<T>>());
        let completed = AtomicUsize::new(0);
        let panicked = AtomicUsize::new(0);
        let workers = self.limit.min(total);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    if abort.is_aborted() {
                        break;
                    }
                    // A panicking job never holds the lock, but stay usable if it was poisoned.
                    let next = queue
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    let Some(task) = next else {
                        break;
                    };
                    match panic::catch_unwind(AssertUnwindSafe(|| job(task))) {
                        Ok(()) => {
                            completed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            tracing::error!("worker task panicked");
                            panicked.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        let completed = completed.into_inner();
        let panicked = panicked.into_inner();
        BatchReport {
            completed,
            panicked,
            skipped: total - completed - panicked,
        }
    }
}

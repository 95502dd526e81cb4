use std::time::Duration;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRY: u32 = 5;
/// Default pause between manifest fetch attempts.
pub const DEFAULT_MANIFEST_BACKOFF: Duration = Duration::from_secs(3);

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up; the attempt budget is spent.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Attempt cap plus fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (`max_attempts = max_retry + 1`).
    pub max_retry: u32,
    /// Delay between manifest fetch attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retry: DEFAULT_MAX_RETRY,
            backoff: DEFAULT_MANIFEST_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retry: u32, backoff: Duration) -> Self {
        Self { max_retry, backoff }
    }

    /// Total attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retry.saturating_add(1)
    }

    /// Decide what to do after `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts() {
            RetryDecision::NoRetry
        } else {
            RetryDecision::RetryAfter(self.backoff)
        }
    }
}

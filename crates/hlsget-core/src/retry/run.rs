//! Retry loop: run a closure until success or the policy says stop.

use std::fmt;

use super::policy::{RetryDecision, RetryPolicy};
use crate::control::AbortToken;

/// Why [`run_with_retry`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final error.
    Exhausted { attempts: u32, last: E },
    /// The abort token fired before or between attempts.
    Aborted,
}

/// Runs `f` until it succeeds or the policy stops retrying. `f` receives the
/// 1-based attempt number. Failed attempts are logged; the backoff sleep
/// wakes early if `abort` fires.
pub fn run_with_retry<T, E, F>(
    policy: &RetryPolicy,
    abort: &AbortToken,
    mut f: F,
) -> Result<T, RetryError<E>>
where
    E: fmt::Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        if abort.is_aborted() {
            return Err(RetryError::Aborted);
        }
        match f(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => match policy.decide(attempt) {
                RetryDecision::NoRetry => {
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = policy.max_attempts(),
                        "attempt failed: {}; retrying in {:?}",
                        e,
                        delay
                    );
                    if !abort.sleep(delay) {
                        return Err(RetryError::Aborted);
                    }
                    attempt += 1;
                }
            },
        }
    }
}

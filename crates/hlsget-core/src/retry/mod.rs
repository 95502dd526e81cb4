//! Retry policy for a download run.
//!
//! Two loops share one `max_retry` budget: the manifest fetch retries with a
//! fixed backoff (a broken manifest fetch is usually a transient blip), and the
//! segment download phase re-attempts missing segments without delay up to
//! the same attempt cap.

mod policy;
mod run;

pub use policy::{RetryDecision, RetryPolicy, DEFAULT_MANIFEST_BACKOFF, DEFAULT_MAX_RETRY};
pub use run::{run_with_retry, RetryError};

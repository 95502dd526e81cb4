//! Error taxonomy for a download run.
//!
//! `FetchError` describes why a single HTTP GET failed; `DownloadError` is what
//! a run (or one of its phases) reports to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of one HTTP GET (manifest or segment).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, DNS, etc.).
    #[error(transparent)]
    Curl(#[from] curl::Error),
    /// Server answered with something other than 200.
    #[error("HTTP {0}")]
    Http(u32),
    /// Body arrived but could not be written to disk.
    #[error("writing segment file failed")]
    Storage(#[source] std::io::Error),
    /// Server answered 200 with no bytes; an empty segment never counts as done.
    #[error("empty response body")]
    EmptyBody,
    /// Request could not be constructed (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid source url {url:?}: {reason}")]
    InvalidSource { url: String, reason: String },

    #[error("manifest fetch failed after {attempts} attempt(s): {url}")]
    ManifestFetchFailed {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },

    #[error("playlist has no segments: {url}")]
    EmptyPlaylist { url: String },

    #[error("encrypted playlist is not supported: {url}")]
    UnsupportedEncryption { url: String },

    #[error("{count} segments exceed the {width}-digit segment name width")]
    CapacityExceeded { count: usize, width: usize },

    #[error("segment {index} failed: {url}")]
    SegmentFetchFailed {
        index: usize,
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("{missing} segment(s) still missing after {attempts} attempt(s)")]
    RetryExhausted { attempts: u32, missing: usize },

    #[error("segment {index} missing at merge time")]
    MissingSegment { index: usize },

    #[error("merge failed at {}", path.display())]
    MergeIoFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cleanup failed at {}", path.display())]
    CleanupIoFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("working directory unusable: {}", path.display())]
    WorkDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("download aborted")]
    Aborted,
}

impl DownloadError {
    /// Whether a later run could pick up where this one stopped.
    ///
    /// Segment files written so far stay on disk for every resumable error.
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            DownloadError::ManifestFetchFailed { .. }
                | DownloadError::SegmentFetchFailed { .. }
                | DownloadError::RetryExhausted { .. }
                | DownloadError::Aborted
        )
    }
}

/// `err` followed by each of its sources, joined with `: `.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

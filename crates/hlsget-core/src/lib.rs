//! Resumable segmented downloads of HLS (m3u8) playlists.
//!
//! A [`Downloader`] fetches a playlist, downloads every segment it lists into
//! a per-download directory with bounded concurrency, retries whatever is
//! still missing, and concatenates the segments in playlist order. Segment
//! files on disk are the only progress record, so rerunning an interrupted
//! download only fetches what is missing.

pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod error;
pub mod http;
pub mod playlist;
pub mod progress;
pub mod retry;
pub mod segment;
pub mod storage;
pub mod url_model;

pub use control::AbortToken;
pub use downloader::{Downloader, DownloaderBuilder, RunReport};
pub use error::{DownloadError, FetchError};

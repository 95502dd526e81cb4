//! Playlist parsing.
//!
//! Turns manifest text into an ordered list of segment references and
//! detects the encryption-key marker. Only flat playlists are understood:
//! every line is either a tag/comment, a segment reference, or noise that the
//! selector rejects.

mod select;

pub use select::{HttpLines, NonCommentLines, SegmentSelector, SelectionMode};

use crate::error::DownloadError;

/// Tag announcing a content-encryption key.
pub const KEY_TAG: &str = "#EXT-X-KEY:";

/// Parsed playlist. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub source_url: String,
    /// Raw references in playback order; position = segment index.
    pub segments: Vec<String>,
    pub encrypted: bool,
}

impl Manifest {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// `#EXT-X-KEY:METHOD=NONE` explicitly declares clear segments.
fn declares_key(line: &str) -> bool {
    match line.strip_prefix(KEY_TAG) {
        Some(attrs) => !attrs
            .split(',')
            .any(|attr| attr.trim().eq_ignore_ascii_case("METHOD=NONE")),
        None => false,
    }
}

/// Parses manifest `text` fetched from `source_url`.
///
/// Lines are trimmed and blank lines skipped. A key tag marks the manifest as
/// encrypted and is never taken as a segment, whatever the selector says.
/// Fails with [`DownloadError::EmptyPlaylist`] when no line is selected.
pub fn parse_manifest(
    text: &str,
    source_url: &str,
    selector: &dyn SegmentSelector,
) -> Result<Manifest, DownloadError> {
    let mut segments = Vec::new();
    let mut encrypted = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(KEY_TAG) {
            if declares_key(line) {
                encrypted = true;
            }
            continue;
        }
        if selector.is_segment(line) {
            segments.push(line.to_string());
        }
    }

    if segments.is_empty() {
        return Err(DownloadError::EmptyPlaylist {
            url: source_url.to_string(),
        });
    }

    tracing::debug!(
        segments = segments.len(),
        encrypted,
        "parsed manifest {}",
        source_url
    );

    Ok(Manifest {
        source_url: source_url.to_string(),
        segments,
        encrypted,
    })
}

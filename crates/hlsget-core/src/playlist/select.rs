//! Segment-selection strategies: which manifest lines are segment references.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Decides whether a (trimmed, non-empty) manifest line is a segment.
///
/// Closures `Fn(&str) -> bool` are selectors too, which is the usual way to
/// drop ad segments some sites splice into their playlists.
pub trait SegmentSelector: Send + Sync {
    fn is_segment(&self, line: &str) -> bool;
}

impl<F> SegmentSelector for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_segment(&self, line: &str) -> bool {
        self(line)
    }
}

/// Every line that is not a tag or comment.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonCommentLines;

impl SegmentSelector for NonCommentLines {
    fn is_segment(&self, line: &str) -> bool {
        !line.starts_with('#')
    }
}

/// Only lines that already carry an absolute `http`/`https` URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpLines;

impl SegmentSelector for HttpLines {
    fn is_segment(&self, line: &str) -> bool {
        line.starts_with("http")
    }
}

/// Built-in selector choice, as written in config.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    #[default]
    NonComment,
    Http,
}

impl SelectionMode {
    pub fn selector(self) -> Arc<dyn SegmentSelector> {
        match self {
            SelectionMode::NonComment => Arc::new(NonCommentLines),
            SelectionMode::Http => Arc::new(HttpLines),
        }
    }
}

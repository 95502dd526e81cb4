//! Segment model and on-disk naming.
//!
//! A segment's local file name is a pure function of its index: the index
//! zero-padded to a fixed width plus a fixed extension (`00042.ts`). The
//! width caps how many segments one run can hold.

use std::path::{Path, PathBuf};

use crate::error::DownloadError;
use crate::playlist::Manifest;
use crate::url_model::UrlResolver;

/// Default zero-padding width of segment file names (`%05d`).
pub const DEFAULT_INDEX_WIDTH: usize = 5;
/// Default segment file extension.
pub const DEFAULT_EXTENSION: &str = "ts";

// 10^18 still fits in a u64 / 64-bit usize.
const MAX_INDEX_WIDTH: usize = 18;

/// Maps segment indices to file names and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentNaming {
    width: usize,
    extension: String,
}

impl Default for SegmentNaming {
    fn default() -> Self {
        Self {
            width: DEFAULT_INDEX_WIDTH,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl SegmentNaming {
    pub fn new(width: usize, extension: impl Into<String>) -> Result<Self, DownloadError> {
        let extension = extension.into();
        if width == 0 || width > MAX_INDEX_WIDTH {
            return Err(DownloadError::InvalidConfig(format!(
                "segment index width must be in 1..={MAX_INDEX_WIDTH}, got {width}"
            )));
        }
        if extension.is_empty()
            || extension.starts_with('.')
            || extension.contains(['/', '\\', '\0'])
        {
            return Err(DownloadError::InvalidConfig(format!(
                "invalid segment extension {extension:?}"
            )));
        }
        Ok(Self { width, extension })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Largest segment count one run may hold: `10^width - 1`.
    pub fn capacity(&self) -> usize {
        10usize
            .checked_pow(self.width as u32)
            .map_or(usize::MAX, |n| n - 1)
    }

    /// Rejects segment counts above [`capacity`](Self::capacity).
    pub fn check_capacity(&self, count: usize) -> Result<(), DownloadError> {
        if count > self.capacity() {
            return Err(DownloadError::CapacityExceeded {
                count,
                width: self.width,
            });
        }
        Ok(())
    }

    pub fn file_name(&self, index: usize) -> String {
        format!("{:0width$}.{}", index, self.extension, width = self.width)
    }

    pub fn path_in(&self, dir: &Path, index: usize) -> PathBuf {
        dir.join(self.file_name(index))
    }

    /// Inverse of [`file_name`](Self::file_name). Anything that is not exactly
    /// `width` ASCII digits plus the extension yields `None`.
    pub fn parse_index(&self, file_name: &str) -> Option<usize> {
        let stem = file_name
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        if stem.len() != self.width || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        stem.parse().ok()
    }
}

/// One addressable chunk of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    /// Raw reference as it appeared in the manifest.
    pub reference: String,
    pub resolved_url: String,
    pub local_path: PathBuf,
}

/// Builds the segment list for a manifest: resolves every reference once and
/// assigns its deterministic local path under `dir`.
pub fn plan_segments(
    manifest: &Manifest,
    resolver: &dyn UrlResolver,
    naming: &SegmentNaming,
    dir: &Path,
) -> Result<Vec<Segment>, DownloadError> {
    naming.check_capacity(manifest.segments.len())?;
    Ok(manifest
        .segments
        .iter()
        .enumerate()
        .map(|(index, reference)| Segment {
            index,
            reference: reference.clone(),
            resolved_url: resolver.resolve(reference, &manifest.source_url),
            local_path: naming.path_in(dir, index),
        })
        .collect())
}

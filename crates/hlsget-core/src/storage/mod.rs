//! On-disk state of a run.
//!
//! The download directory is the only record of progress: a segment is done
//! iff its file exists with non-zero length. Writes go to a `.part` sibling
//! first and are renamed into place, so a crash mid-write never leaves a
//! file that looks complete.

mod merge;
mod writer;

pub use merge::merge_segments;
pub use writer::write_segment;

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::segment::SegmentNaming;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `00001.ts` → `00001.ts.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// True if `path` is a regular file with at least one byte.
pub fn is_complete(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// Indices of all complete segment files in `dir`, in ascending order.
/// Entries that are not segment files (temp files, strays) are ignored.
pub fn scan_completed(dir: &Path, naming: &SegmentNaming) -> io::Result<BTreeSet<usize>> {
    let mut done = BTreeSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(index) = name.to_str().and_then(|n| naming.parse_index(n)) else {
            continue;
        };
        let meta = entry.metadata()?;
        if meta.is_file() && meta.len() > 0 {
            done.insert(index);
        }
    }
    Ok(done)
}

/// Indices in `[0, total)` not present in `done`, ascending.
pub fn missing_indices(total: usize, done: &BTreeSet<usize>) -> Vec<usize> {
    (0..total).filter(|i| !done.contains(i)).collect()
}

/// Removes the download directory and everything in it. A directory that is
/// already gone counts as removed.
pub fn remove_debris(dir: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

//! Ordered concatenation of segment files into the output artifact.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use super::temp_path;
use crate::error::DownloadError;
use crate::segment::SegmentNaming;

fn merge_err(path: &Path) -> impl FnOnce(io::Error) -> DownloadError + '_ {
    move |source| DownloadError::MergeIoFailed {
        path: path.to_path_buf(),
        source,
    }
}

/// Segment files in `dir` with index `< total`, sorted by the numeric index
/// parsed from the name (never by listing or creation order).
fn ordered_segment_files(
    dir: &Path,
    naming: &SegmentNaming,
    total: usize,
) -> Result<Vec<(usize, PathBuf)>, DownloadError> {
    let mut files = Vec::with_capacity(total);
    for entry in std::fs::read_dir(dir).map_err(merge_err(dir))? {
        let entry = entry.map_err(merge_err(dir))?;
        let name = entry.file_name();
        let Some(index) = name.to_str().and_then(|n| naming.parse_index(n)) else {
            continue;
        };
        if index >= total {
            tracing::warn!(index, total, "ignoring segment file beyond playlist length");
            continue;
        }
        files.push((index, entry.path()));
    }
    files.sort_unstable_by_key(|(index, _)| *index);
    Ok(files)
}

/// Concatenates segments `0..total` from `dir` into `output`, each exactly
/// once, in index order. The output is assembled in `<output>.part` and
/// renamed on success. Returns the number of bytes written.
pub fn merge_segments(
    dir: &Path,
    naming: &SegmentNaming,
    total: usize,
    output: &Path,
) -> Result<u64, DownloadError> {
    let files = ordered_segment_files(dir, naming, total)?;
    for (expected, (index, _)) in files.iter().enumerate() {
        if *index != expected {
            return Err(DownloadError::MissingSegment { index: expected });
        }
    }
    if files.len() != total {
        return Err(DownloadError::MissingSegment { index: files.len() });
    }

    let tmp = temp_path(output);
    let result = (|| {
        let mut out = BufWriter::new(File::create(&tmp).map_err(merge_err(&tmp))?);
        let mut written = 0u64;
        for (_, path) in &files {
            let mut segment = File::open(path).map_err(merge_err(path))?;
            written += io::copy(&mut segment, &mut out).map_err(merge_err(path))?;
        }
        let file = out
            .into_inner()
            .map_err(|e| e.into_error())
            .map_err(merge_err(&tmp))?;
        file.sync_all().map_err(merge_err(&tmp))?;
        drop(file);
        std::fs::rename(&tmp, output).map_err(merge_err(output))?;
        Ok(written)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

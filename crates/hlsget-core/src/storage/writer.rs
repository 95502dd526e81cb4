//! Atomic write of one segment file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::temp_path;

/// Writes `data` to `final_path` via `<final_path>.part` + rename. On error
/// the temp file is removed best-effort and `final_path` is untouched.
pub fn write_segment(final_path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp = temp_path(final_path);
    let result = (|| {
        let mut file = File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, final_path)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

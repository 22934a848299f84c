//! Turns a walked file path into a [`FileRecord`].

use std::path::Path;

use chrono::{DateTime, Local};
use tracing::debug;

use blink_core::{FileRecord, ScanWarning};

/// Stat `path` once and build its record.
///
/// A file that vanished or became unreadable since it was listed, or that is
/// no longer a regular file, comes back as a warning instead.
pub fn build_record(path: &Path, now: DateTime<Local>) -> Result<FileRecord, ScanWarning> {
    let metadata = std::fs::symlink_metadata(path).map_err(|err| {
        debug!(path = %path.display(), error = %err, "skipping file");
        ScanWarning::from_io(path, &err)
    })?;

    if !metadata.is_file() {
        debug!(path = %path.display(), "entry is no longer a regular file");
        return Err(ScanWarning::unsupported(path));
    }

    Ok(FileRecord::new(
        path,
        metadata.len(),
        metadata.accessed().ok(),
        now,
    ))
}

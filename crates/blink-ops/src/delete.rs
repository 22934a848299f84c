//! Synchronous single-file and batch deletion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// How a file is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteMode {
    /// Unlink immediately.
    #[default]
    Permanent,
    /// Move to the OS trash / recycle bin.
    Trash,
}

/// Why a deletion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeleteFailureKind {
    NotFound,
    PermissionDenied,
    /// The path is a directory, symlink or special file.
    NotAFile,
    /// The trash backend refused the file.
    Trash,
    Other,
}

/// A failed deletion of one path.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("cannot delete {}: {message}", .path.display())]
pub struct DeleteError {
    pub path: PathBuf,
    pub kind: DeleteFailureKind,
    pub message: String,
}

impl DeleteError {
    pub fn new(path: impl Into<PathBuf>, kind: DeleteFailureKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Classify an I/O error raised while deleting `path`.
    pub fn io(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        let kind = match error.kind() {
            io::ErrorKind::NotFound => DeleteFailureKind::NotFound,
            io::ErrorKind::PermissionDenied => DeleteFailureKind::PermissionDenied,
            _ => DeleteFailureKind::Other,
        };
        Self::new(path, kind, error.to_string())
    }
}

/// Delete a single regular file and return the bytes it held.
///
/// Directories are refused; only files from a scan's candidate list are
/// meant to come through here.
pub fn delete_path(path: &Path, mode: DeleteMode) -> Result<u64, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::io(path, &e))?;
    if !metadata.is_file() {
        return Err(DeleteError::new(
            path,
            DeleteFailureKind::NotAFile,
            "not a regular file",
        ));
    }
    let size = metadata.len();

    match mode {
        DeleteMode::Permanent => fs::remove_file(path).map_err(|e| DeleteError::io(path, &e))?,
        DeleteMode::Trash => trash::delete(path)
            .map_err(|e| DeleteError::new(path, DeleteFailureKind::Trash, e.to_string()))?,
    }

    debug!(path = %path.display(), size, ?mode, "deleted");
    Ok(size)
}

/// Outcome of a batch of deletions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Deleted paths with the bytes each freed.
    pub deleted: Vec<(PathBuf, u64)>,
    pub failures: Vec<DeleteError>,
    pub bytes_freed: u64,
}

impl DeletionReport {
    pub fn succeeded(&self) -> usize {
        self.deleted.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Check if every deletion went through.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(&mut self, path: PathBuf, result: Result<u64, DeleteError>) {
        match result {
            Ok(size) => {
                self.bytes_freed += size;
                self.deleted.push((path, size));
            }
            Err(err) => self.failures.push(err),
        }
    }
}

/// Attempt every path in order. A failure is recorded and the batch moves on.
pub fn delete_batch<I, P>(paths: I, mode: DeleteMode) -> DeletionReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = DeletionReport::default();
    for path in paths {
        let path = path.as_ref();
        report.record(path.to_path_buf(), delete_path(path, mode));
    }
    info!(
        deleted = report.succeeded(),
        failed = report.failed(),
        bytes_freed = report.bytes_freed,
        "deletion batch finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("old.iso");
        fs::write(&path, vec![0u8; 1234]).unwrap();

        let freed = delete_path(&path, DeleteMode::Permanent).unwrap();
        assert_eq!(freed, 1234);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = delete_path(&temp.path().join("ghost"), DeleteMode::Permanent).unwrap_err();
        assert_eq!(err.kind, DeleteFailureKind::NotFound);
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_directories_are_refused() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("keep");
        fs::create_dir(&dir).unwrap();

        let err = delete_path(&dir, DeleteMode::Permanent).unwrap_err();
        assert_eq!(err.kind, DeleteFailureKind::NotAFile);
        assert!(dir.exists());
    }

    #[test]
    fn test_batch_continues_after_failure() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a.bin");
        let b = temp.path().join("b.bin");
        fs::write(&a, [1u8; 10]).unwrap();
        fs::write(&b, [1u8; 20]).unwrap();

        let report = delete_batch(
            [a.clone(), temp.path().join("missing.bin"), b.clone()],
            DeleteMode::Permanent,
        );

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.bytes_freed, 30);
        assert!(!report.is_success());
        assert!(!a.exists() && !b.exists());
    }
}

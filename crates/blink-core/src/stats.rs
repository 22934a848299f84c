//! Running totals for a scan pass.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Summary statistics for a scan.
///
/// Totals are sums and maxima only, so partial stats from parallel workers
/// merge to the same result in any order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Number of successfully stat'd regular files.
    pub total_files: u64,
    /// Sum of their sizes in bytes.
    pub total_bytes: u64,
    /// Number of directories visited, root excluded.
    pub total_dirs: u64,
    /// Number of symbolic links seen (never followed).
    pub total_symlinks: u64,
    /// Entries skipped because of per-entry failures.
    pub skipped_entries: u64,
    /// Deepest directory level reached.
    pub max_depth: u32,
    /// Largest file (path, size).
    pub largest_file: Option<(PathBuf, u64)>,
    /// Wall-clock time of the pass.
    pub duration: Duration,
}

impl ScanStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update stats with a file entry.
    pub fn record_file(&mut self, path: &Path, size: u64) {
        self.total_files += 1;
        self.total_bytes += size;

        if beats_largest(path, size, &self.largest_file) {
            self.largest_file = Some((path.to_path_buf(), size));
        }
    }

    /// Record a directory.
    pub fn record_dir(&mut self, depth: u32) {
        self.total_dirs += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Record a symlink.
    pub fn record_symlink(&mut self) {
        self.total_symlinks += 1;
    }

    /// Record a skipped entry.
    pub fn record_skip(&mut self) {
        self.skipped_entries += 1;
    }

    /// Fold another partial into this one.
    pub fn merge(&mut self, other: ScanStats) {
        self.total_files += other.total_files;
        self.total_bytes += other.total_bytes;
        self.total_dirs += other.total_dirs;
        self.total_symlinks += other.total_symlinks;
        self.skipped_entries += other.skipped_entries;
        self.max_depth = self.max_depth.max(other.max_depth);
        if let Some((path, size)) = other.largest_file {
            if beats_largest(&path, size, &self.largest_file) {
                self.largest_file = Some((path, size));
            }
        }
        self.duration = self.duration.max(other.duration);
    }
}

// Ties keep the lexicographically smaller path so merge order does not matter.
fn beats_largest(path: &Path, size: u64, current: &Option<(PathBuf, u64)>) -> bool {
    match current {
        None => true,
        Some((p, s)) => size > *s || (size == *s && path < p.as_path()),
    }
}

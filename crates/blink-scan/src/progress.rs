//! Scan progress reporting.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::broadcast;

/// Files between two progress broadcasts.
const REPORT_EVERY: u64 = 1000;

/// Stage of a scan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanPhase {
    /// Listing directories.
    Walking,
    /// Reading metadata and aggregating.
    Aggregating,
    /// Finished.
    Complete,
}

/// Progress information during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanProgress {
    pub phase: ScanPhase,
    /// Files discovered (walking) or aggregated (aggregating) so far.
    pub files_scanned: u64,
    /// Number of directories scanned so far.
    pub dirs_scanned: u64,
    /// Total bytes aggregated so far.
    pub bytes_scanned: u64,
    /// Entries skipped so far.
    pub skipped: u64,
    /// Most recent path seen.
    pub current_path: PathBuf,
    /// Time elapsed since scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_scanned as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// Shared progress counters. Safe to update from many rayon workers at once.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    tx: broadcast::Sender<ScanProgress>,
    start: Instant,
    files: AtomicU64,
    dirs: AtomicU64,
    bytes: AtomicU64,
    skipped: AtomicU64,
}

impl ProgressTracker {
    pub fn new(tx: broadcast::Sender<ScanProgress>, start: Instant) -> Self {
        Self {
            tx,
            start,
            files: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    pub fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a file; every `REPORT_EVERY` files a snapshot is broadcast.
    pub fn record_file(&self, phase: ScanPhase, path: &Path, size: u64) {
        self.bytes.fetch_add(size, Ordering::Relaxed);
        let count = self.files.fetch_add(1, Ordering::Relaxed) + 1;
        if count % REPORT_EVERY == 0 {
            self.send(phase, path);
        }
    }

    /// Reset the file counters between phases. Directory and skip counts carry over.
    pub fn begin(&self, phase: ScanPhase, path: &Path) {
        self.files.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.send(phase, path);
    }

    pub fn send(&self, phase: ScanPhase, path: &Path) {
        // No subscribers is fine.
        let _ = self.tx.send(self.snapshot(phase, path));
    }

    pub fn snapshot(&self, phase: ScanPhase, path: &Path) -> ScanProgress {
        ScanProgress {
            phase,
            files_scanned: self.files.load(Ordering::Relaxed),
            dirs_scanned: self.dirs.load(Ordering::Relaxed),
            bytes_scanned: self.bytes.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            current_path: path.to_path_buf(),
            elapsed: self.start.elapsed(),
        }
    }
}

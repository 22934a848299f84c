//! Progress events for background deletion.

use std::path::PathBuf;

use serde::Serialize;

use crate::delete::{DeleteError, DeletionReport};

/// Counters for a running deletion batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionProgress {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
    pub bytes_freed: u64,
    /// The file about to be deleted.
    pub current: Option<PathBuf>,
}

impl DeletionProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Get the progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.deleted + self.failed) as f64 / self.total as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Message sent through the channel returned by
/// [`start_deletion`](crate::start_deletion).
#[derive(Debug, Clone)]
pub enum DeletionEvent {
    Progress(DeletionProgress),
    /// One path could not be deleted. The batch continues.
    Failed(DeleteError),
    /// Always the last event.
    Complete(DeletionReport),
}

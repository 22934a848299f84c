//! Deletion executor for blink.
//!
//! Scans never touch the filesystem; this crate is the only place files are
//! removed. It takes paths, deletes regular files either permanently or via
//! the OS trash, and reports each failure without stopping the batch.

mod delete;
mod progress;
mod task;

pub use delete::{
    DeleteError, DeleteFailureKind, DeleteMode, DeletionReport, delete_batch, delete_path,
};
pub use progress::{DeletionEvent, DeletionProgress};
pub use task::start_deletion;

/// Default channel buffer size for deletion progress updates.
pub const DELETION_CHANNEL_SIZE: usize = 100;

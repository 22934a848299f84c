//! Background deletion on the tokio runtime.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::warn;

use crate::delete::{DeleteError, DeleteFailureKind, DeleteMode, DeletionReport, delete_path};
use crate::progress::{DeletionEvent, DeletionProgress};
use crate::DELETION_CHANNEL_SIZE;

/// Delete `items` on a background task, one blocking call per file.
///
/// The receiver sees a `Progress` before each file, a `Failed` for each
/// file that could not be removed, and a final `Complete` with the report.
/// Must be called from within a tokio runtime.
pub fn start_deletion(items: Vec<PathBuf>, mode: DeleteMode) -> mpsc::Receiver<DeletionEvent> {
    let (tx, rx) = mpsc::channel(DELETION_CHANNEL_SIZE);

    tokio::spawn(async move {
        let mut progress = DeletionProgress::new(items.len());
        let mut report = DeletionReport::default();

        for path in items {
            progress.current = Some(path.clone());
            let _ = tx.send(DeletionEvent::Progress(progress.clone())).await;

            let target = path.clone();
            let result = tokio::task::spawn_blocking(move || delete_path(&target, mode))
                .await
                .unwrap_or_else(|e| {
                    Err(DeleteError::new(
                        &path,
                        DeleteFailureKind::Other,
                        format!("Task failed: {e}"),
                    ))
                });

            match &result {
                Ok(size) => {
                    progress.deleted += 1;
                    progress.bytes_freed += size;
                }
                Err(err) => {
                    warn!(path = %err.path.display(), error = %err.message, "deletion failed");
                    progress.failed += 1;
                    let _ = tx.send(DeletionEvent::Failed(err.clone())).await;
                }
            }
            report.record(path, result);
        }

        let _ = tx.send(DeletionEvent::Complete(report)).await;
    });

    rx
}

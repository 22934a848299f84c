//! Top-down directory walk with hidden-entry pruning.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use blink_core::{ScanConfig, ScanWarning, WarningKind};

use crate::cancel::Checkpoint;
use crate::classifier::is_excluded;

/// What kind of entry the walk produced. Symlinks are reported, never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    /// Socket, FIFO, device or anything else that is not a regular file.
    Special,
}

/// One entry yielded by the walk.
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Distance from the root; the root itself is depth 0.
    pub depth: usize,
    /// Set when this is a directory whose listing could not be read. Its
    /// subtree was not visited.
    pub read_error: Option<ScanWarning>,
}

/// Parallel directory walker built on jwalk.
///
/// Excluded entries are removed from each directory listing before the walk
/// descends, so an excluded directory's subtree is never read.
pub struct Walker {
    config: Arc<ScanConfig>,
    checkpoint: Checkpoint,
}

impl Walker {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: Arc::new(config.clone()),
            checkpoint: Checkpoint::new(CancellationToken::new(), config.deadline, Instant::now()),
        }
    }

    /// Stop descending once `token` is cancelled.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.checkpoint = Checkpoint::new(token, self.config.deadline, Instant::now());
        self
    }

    pub(crate) fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Lazily walk `root`. Directory read failures come out as warnings.
    pub fn walk(
        &self,
        root: &Path,
    ) -> impl Iterator<Item = Result<WalkEntry, ScanWarning>> + use<> {
        let parallelism = match self.config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: std::time::Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };
        let max_depth = self
            .config
            .max_depth
            .map_or(usize::MAX, |d| d as usize);

        let config = Arc::clone(&self.config);
        let checkpoint = self.checkpoint.clone();

        WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(false)
            .max_depth(max_depth)
            .process_read_dir(move |depth, _parent, _state, children| {
                if checkpoint.should_stop() {
                    children.clear();
                    return;
                }
                // The first call carries only the root entry, which is never filtered.
                if depth.is_none() {
                    return;
                }
                children.retain(|child| match child {
                    Ok(entry) => !is_excluded(entry.file_name(), &entry.path(), &config),
                    Err(_) => true,
                });
            })
            .into_iter()
            .map(|result| match result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    let kind = if file_type.is_symlink() {
                        EntryKind::Symlink
                    } else if file_type.is_dir() {
                        EntryKind::Dir
                    } else if file_type.is_file() {
                        EntryKind::File
                    } else {
                        EntryKind::Special
                    };
                    let path = entry.path();
                    let read_error = entry
                        .read_children_error
                        .as_ref()
                        .map(|err| read_warning(err, &path));
                    Ok(WalkEntry {
                        path,
                        kind,
                        depth: entry.depth,
                        read_error,
                    })
                }
                Err(err) => Err(read_warning(&err, Path::new(""))),
            })
    }
}

// jwalk reports an unreadable directory on the directory's own entry, and
// other failures as error items.
fn read_warning(err: &jwalk::Error, fallback: &Path) -> ScanWarning {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    let kind = match err.io_error().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
        Some(std::io::ErrorKind::NotFound) => WarningKind::NotFound,
        _ => WarningKind::ReadError,
    };
    warn!(path = %path.display(), error = %err, "cannot read directory");
    ScanWarning::new(path, err.to_string(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(walker: &Walker, root: &Path) -> Vec<String> {
        let mut names: Vec<String> = walker
            .walk(root)
            .filter_map(Result::ok)
            .filter(|e| e.depth > 0)
            .map(|e| {
                e.path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_hidden_subtree_is_pruned() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(".hidden/inner")).unwrap();
        fs::write(root.join(".hidden/inner/secret.txt"), "x").unwrap();
        fs::write(root.join(".dotfile"), "x").unwrap();
        fs::write(root.join("visible.txt"), "x").unwrap();

        let mut config = ScanConfig::new(root);
        config.platform = blink_core::Platform::Posix;
        let walker = Walker::new(&config);
        assert_eq!(names(&walker, root), vec!["visible.txt"]);

        config.include_hidden = true;
        let walker = Walker::new(&config);
        assert_eq!(
            names(&walker, root),
            vec![
                ".dotfile",
                ".hidden",
                ".hidden/inner",
                ".hidden/inner/secret.txt",
                "visible.txt"
            ]
        );
    }

    #[test]
    fn test_excluded_name_at_depth() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/node_modules/pkg")).unwrap();
        fs::write(root.join("a/node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join("a/main.js"), "x").unwrap();

        let mut config = ScanConfig::new(root);
        config.exclude_names = vec!["node_modules".to_string()];
        let walker = Walker::new(&config);
        assert_eq!(names(&walker, root), vec!["a", "a/main.js"]);
    }

    #[test]
    fn test_cancelled_walk_does_not_descend() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/c.txt"), "x").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let walker = Walker::new(&ScanConfig::new(root)).with_cancel(token);
        assert!(names(&walker, root).is_empty());
    }
}

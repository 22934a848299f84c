//! JWalk-based parallel scanner.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Local;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use blink_analyze::{RankConfig, Ranker};
use blink_core::{ScanConfig, ScanError, ScanStats, ScanWarning};

use crate::aggregate::{Aggregates, aggregate};
use crate::cancel::Checkpoint;
use crate::progress::{ProgressTracker, ScanPhase, ScanProgress};
use crate::result::ScanResult;
use crate::walker::{EntryKind, Walker};

/// Scanner that walks with jwalk and aggregates on rayon.
pub struct JwalkScanner {
    progress_tx: broadcast::Sender<ScanProgress>,
    cancel: CancellationToken,
}

impl JwalkScanner {
    /// Create a new scanner.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self {
            progress_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `token` as the stop signal for every scan run by this scanner.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan `config.root`: walk, stat, aggregate and rank.
    ///
    /// Only an unusable root, an invalid config, cancellation or an expired
    /// deadline produce `Err`. Anything wrong with a single entry is counted
    /// in `stats.skipped_entries` and listed in `warnings`.
    pub fn scan(&self, config: &ScanConfig) -> Result<ScanResult, ScanError> {
        config.validate()?;
        let start = Instant::now();
        let checkpoint = Checkpoint::new(self.cancel.clone(), config.deadline, start);

        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        std::fs::read_dir(&root).map_err(|e| ScanError::io(&root, e))?;

        info!(root = %root.display(), "starting scan");
        let tracker = ProgressTracker::new(self.progress_tx.clone(), start);
        tracker.begin(ScanPhase::Walking, &root);

        let mut stats = ScanStats::new();
        let mut warnings = Vec::new();
        let files = self.collect_files(config, &root, &checkpoint, &tracker, &mut stats, &mut warnings)?;
        debug!(files = files.len(), dirs = stats.total_dirs, "walk finished");

        tracker.begin(ScanPhase::Aggregating, &root);
        let ranker = Ranker::new(RankConfig::from(config));
        let now = Local::now();
        let aggregates = match config.threads {
            0 => aggregate(&files, now, &ranker, &checkpoint, &tracker)?,
            n => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| aggregate(&files, now, &ranker, &checkpoint, &tracker))?,
                Err(err) => {
                    warn!(error = %err, "cannot build thread pool, using the global one");
                    aggregate(&files, now, &ranker, &checkpoint, &tracker)?
                }
            },
        };
        let Aggregates {
            index,
            histogram,
            stale,
            stats: file_stats,
            warnings: file_warnings,
        } = aggregates;

        let candidates = ranker.rank(&stale);

        stats.merge(file_stats);
        warnings.extend(file_warnings);
        warnings.sort_by(|a, b| a.path.cmp(&b.path));
        stats.duration = start.elapsed();

        tracker.send(ScanPhase::Complete, &root);
        info!(
            files = stats.total_files,
            bytes = stats.total_bytes,
            skipped = stats.skipped_entries,
            candidates = candidates.len(),
            elapsed_ms = stats.duration.as_millis() as u64,
            "scan complete"
        );

        Ok(ScanResult {
            root,
            config: config.clone(),
            stats,
            index,
            histogram,
            candidates,
            warnings,
        })
    }

    /// Walk the tree, counting directories, links and special files, and
    /// return the regular files to aggregate.
    fn collect_files(
        &self,
        config: &ScanConfig,
        root: &std::path::Path,
        checkpoint: &Checkpoint,
        tracker: &ProgressTracker,
        stats: &mut ScanStats,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<PathBuf>, ScanError> {
        let walker = Walker::new(config).with_checkpoint(checkpoint.clone());
        let mut files = Vec::new();

        for item in walker.walk(root) {
            checkpoint.check()?;
            let mut entry = match item {
                Ok(entry) => entry,
                Err(warning) => {
                    stats.record_skip();
                    tracker.record_skip();
                    warnings.push(warning);
                    continue;
                }
            };
            if let Some(warning) = entry.read_error.take() {
                stats.record_skip();
                tracker.record_skip();
                warnings.push(warning);
            }

            match entry.kind {
                EntryKind::File => {
                    tracker.record_file(ScanPhase::Walking, &entry.path, 0);
                    files.push(entry.path);
                }
                EntryKind::Dir if entry.depth > 0 => {
                    stats.record_dir(entry.depth as u32);
                    tracker.record_dir();
                }
                EntryKind::Dir => {}
                EntryKind::Symlink => stats.record_symlink(),
                EntryKind::Special => {
                    debug!(path = %entry.path.display(), "skipping special file");
                    stats.record_skip();
                    tracker.record_skip();
                    warnings.push(ScanWarning::unsupported(entry.path));
                }
            }
        }

        // A stop signal during the walk prunes the remaining directories
        // rather than ending the iterator with an error.
        checkpoint.check()?;
        Ok(files)
    }
}

impl Default for JwalkScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan with a fresh scanner and no external stop signal.
pub fn scan(config: &ScanConfig) -> Result<ScanResult, ScanError> {
    JwalkScanner::new().scan(config)
}

//! Per-worker partial aggregates and their merge.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use rayon::prelude::*;

use blink_analyze::{ExtensionIndex, Ranker, SizeHistogram};
use blink_core::{FileRecord, ScanError, ScanStats, ScanWarning};

use crate::builder::build_record;
use crate::cancel::Checkpoint;
use crate::progress::{ProgressTracker, ScanPhase};

/// Everything one worker learned from its share of the files.
///
/// `merge` only sums counters, appends heaps and concatenates lists, so the
/// merged result does not depend on how files were split across workers.
#[derive(Debug, Default)]
pub(crate) struct Aggregates {
    pub index: ExtensionIndex,
    pub histogram: SizeHistogram,
    /// Records that pass the ranker's staleness filter.
    pub stale: Vec<Arc<FileRecord>>,
    pub stats: ScanStats,
    pub warnings: Vec<ScanWarning>,
}

impl Aggregates {
    fn observe(&mut self, record: FileRecord, ranker: &Ranker) {
        self.stats.record_file(&record.path, record.size);
        self.histogram.observe(record.size);
        let record = Arc::new(record);
        if ranker.qualifies(&record) {
            self.stale.push(Arc::clone(&record));
        }
        self.index.observe(record);
    }

    fn skip(&mut self, warning: ScanWarning) {
        self.stats.record_skip();
        self.warnings.push(warning);
    }

    fn merge(mut self, other: Aggregates) -> Self {
        self.index.merge(other.index);
        self.histogram.merge(&other.histogram);
        self.stale.extend(other.stale);
        self.stats.merge(other.stats);
        self.warnings.extend(other.warnings);
        self
    }
}

/// Stat and aggregate `paths` in parallel.
///
/// The checkpoint is polled before every file; once it trips, the partial
/// results are dropped and the error is returned.
pub(crate) fn aggregate(
    paths: &[PathBuf],
    now: DateTime<Local>,
    ranker: &Ranker,
    checkpoint: &Checkpoint,
    progress: &ProgressTracker,
) -> Result<Aggregates, ScanError> {
    paths
        .par_iter()
        .try_fold(Aggregates::default, |mut acc, path| -> Result<Aggregates, ScanError> {
            checkpoint.check()?;
            match build_record(path, now) {
                Ok(record) => {
                    progress.record_file(ScanPhase::Aggregating, path, record.size);
                    acc.observe(record, ranker);
                }
                Err(warning) => {
                    progress.record_skip();
                    acc.skip(warning);
                }
            }
            Ok(acc)
        })
        .try_reduce(Aggregates::default, |a, b| Ok(a.merge(b)))
}

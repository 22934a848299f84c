//! The outcome of a completed scan and its serializable report view.

use std::path::PathBuf;

use serde::Serialize;

use blink_analyze::{BucketSummary, DeleteCandidate, ExtensionIndex, SizeHistogram};
use blink_core::{ScanConfig, ScanStats, ScanWarning};

/// Everything a completed scan produced. Owned by the caller; nothing is
/// shared with later scans.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    pub config: ScanConfig,
    pub stats: ScanStats,
    pub index: ExtensionIndex,
    pub histogram: SizeHistogram,
    /// Deletion candidates, highest priority first.
    pub candidates: Vec<DeleteCandidate>,
    /// One entry per skipped path, sorted by path.
    pub warnings: Vec<ScanWarning>,
}

impl ScanResult {
    pub fn total_files(&self) -> u64 {
        self.stats.total_files
    }

    pub fn total_bytes(&self) -> u64 {
        self.stats.total_bytes
    }

    /// Bytes the candidate list would free if every entry were deleted.
    pub fn reclaimable_bytes(&self) -> u64 {
        self.candidates.iter().map(|c| c.record.size).sum()
    }

    /// Build the report view with the `top_extensions` largest extensions,
    /// listing up to `files_per_extension` files for each.
    pub fn report(&self, top_extensions: usize, files_per_extension: usize) -> ScanReport {
        let cumulative = self.histogram.to_cumulative();
        let histogram = self
            .histogram
            .bins()
            .into_iter()
            .zip(self.histogram.to_percentages())
            .zip(cumulative)
            .map(|((totals, pct), running)| HistogramRow {
                bin: totals.bin.to_string(),
                count: totals.count,
                total_bytes: totals.total_bytes,
                count_percent: pct.count_percent,
                bytes_percent: pct.bytes_percent,
                cumulative_count: running.count,
                cumulative_bytes: running.total_bytes,
            })
            .collect();

        ScanReport {
            root: self.root.clone(),
            stats: self.stats.clone(),
            extensions: self.index.summaries(top_extensions, files_per_extension),
            extensionless_files: self.index.extensionless_files(),
            extensionless_bytes: self.index.extensionless_bytes(),
            histogram,
            candidates: self.candidates.clone(),
            warnings: self.warnings.clone(),
        }
    }
}

/// One histogram line of a report.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramRow {
    pub bin: String,
    pub count: u64,
    pub total_bytes: u64,
    pub count_percent: f64,
    pub bytes_percent: f64,
    pub cumulative_count: u64,
    pub cumulative_bytes: u64,
}

/// Serializable summary of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub stats: ScanStats,
    pub extensions: Vec<BucketSummary>,
    pub extensionless_files: u64,
    pub extensionless_bytes: u64,
    pub histogram: Vec<HistogramRow>,
    pub candidates: Vec<DeleteCandidate>,
    pub warnings: Vec<ScanWarning>,
}

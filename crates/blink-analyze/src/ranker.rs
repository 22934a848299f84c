//! Staleness filter and delete-priority ranking.
//!
//! A record qualifies when its staleness is known and strictly above the
//! threshold. Qualifying records are scored as
//!
//! ```text
//! priority = stale_weight * staleness_days + size_weight * (size * normalization_rate)
//! ```
//!
//! and the top `top_k` are returned, highest priority first, ties broken by
//! path ascending.

use std::cmp::Ordering;
use std::sync::Arc;

use derive_builder::Builder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use blink_core::{
    DEFAULT_NORMALIZATION_RATE, DEFAULT_SIZE_WEIGHT, DEFAULT_STALE_THRESHOLD_DAYS,
    DEFAULT_STALE_WEIGHT, DEFAULT_TOP_K, FileRecord, ScanConfig,
};

/// Parameters of the delete-priority formula.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct RankConfig {
    /// Records must be strictly older than this many days.
    #[builder(default = "DEFAULT_STALE_THRESHOLD_DAYS")]
    pub stale_threshold_days: i64,

    /// Maximum number of candidates returned.
    #[builder(default = "DEFAULT_TOP_K")]
    pub top_k: usize,

    #[builder(default = "DEFAULT_SIZE_WEIGHT")]
    pub size_weight: f64,

    #[builder(default = "DEFAULT_STALE_WEIGHT")]
    pub stale_weight: f64,

    /// Bytes are multiplied by this before weighting.
    #[builder(default = "DEFAULT_NORMALIZATION_RATE")]
    pub normalization_rate: f64,
}

impl RankConfig {
    /// Create a new config builder.
    pub fn builder() -> RankConfigBuilder {
        RankConfigBuilder::default()
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            stale_threshold_days: DEFAULT_STALE_THRESHOLD_DAYS,
            top_k: DEFAULT_TOP_K,
            size_weight: DEFAULT_SIZE_WEIGHT,
            stale_weight: DEFAULT_STALE_WEIGHT,
            normalization_rate: DEFAULT_NORMALIZATION_RATE,
        }
    }
}

impl From<&ScanConfig> for RankConfig {
    fn from(config: &ScanConfig) -> Self {
        Self {
            stale_threshold_days: config.stale_threshold_days,
            top_k: config.top_k,
            size_weight: config.size_weight,
            stale_weight: config.stale_weight,
            normalization_rate: config.normalization_rate,
        }
    }
}

/// A ranked record together with its delete priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteCandidate {
    pub record: Arc<FileRecord>,
    pub priority: f64,
}

impl DeleteCandidate {
    /// Descending priority, then ascending path.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| self.record.path.cmp(&other.record.path))
    }
}

/// Scores and selects deletion candidates.
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: RankConfig,
}

impl Ranker {
    pub fn new(config: RankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Whether a record passes the staleness filter.
    pub fn qualifies(&self, record: &FileRecord) -> bool {
        record.is_stale(self.config.stale_threshold_days)
    }

    /// Delete priority of a record, or `None` if it does not qualify.
    pub fn priority(&self, record: &FileRecord) -> Option<f64> {
        if !self.qualifies(record) {
            return None;
        }
        let days = record.staleness_days? as f64;
        let normalized = record.size as f64 * self.config.normalization_rate;
        Some(self.config.stale_weight * days + self.config.size_weight * normalized)
    }

    /// Rank `records`, returning at most `top_k` candidates in descending
    /// priority order.
    pub fn rank(&self, records: &[Arc<FileRecord>]) -> Vec<DeleteCandidate> {
        let k = self.config.top_k;
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<DeleteCandidate> = records
            .par_iter()
            .filter_map(|record| {
                self.priority(record).map(|priority| DeleteCandidate {
                    record: Arc::clone(record),
                    priority,
                })
            })
            .collect();

        let qualifying = scored.len();
        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, DeleteCandidate::rank_cmp);
            scored.truncate(k);
        }
        scored.sort_by(DeleteCandidate::rank_cmp);

        debug!(
            records = records.len(),
            qualifying,
            selected = scored.len(),
            "ranked deletion candidates"
        );
        scored
    }
}

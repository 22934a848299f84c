//! Scan configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ScanError;
use crate::platform::{Platform, default_exclude_names};

/// Default number of days after which an unaccessed file counts as stale.
pub const DEFAULT_STALE_THRESHOLD_DAYS: i64 = 30;
/// Default length of the deletion candidate list.
pub const DEFAULT_TOP_K: usize = 20;
/// Default weight of the normalized size term.
pub const DEFAULT_SIZE_WEIGHT: f64 = 0.8;
/// Default weight of the staleness term.
pub const DEFAULT_STALE_WEIGHT: f64 = 0.2;
/// Default factor that scales bytes down to be commensurable with days.
pub const DEFAULT_NORMALIZATION_RATE: f64 = 1e-5;

/// Configuration for a scan-classify-rank pass.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Files accessed more than this many days ago are stale.
    #[builder(default = "DEFAULT_STALE_THRESHOLD_DAYS")]
    #[serde(default = "default_stale_threshold_days")]
    pub stale_threshold_days: i64,

    /// Maximum number of deletion candidates to return.
    #[builder(default = "DEFAULT_TOP_K")]
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Weight of the normalized size in the delete priority.
    #[builder(default = "DEFAULT_SIZE_WEIGHT")]
    #[serde(default = "default_size_weight")]
    pub size_weight: f64,

    /// Weight of the staleness days in the delete priority.
    #[builder(default = "DEFAULT_STALE_WEIGHT")]
    #[serde(default = "default_stale_weight")]
    pub stale_weight: f64,

    /// Multiplier applied to byte sizes before weighting.
    #[builder(default = "DEFAULT_NORMALIZATION_RATE")]
    #[serde(default = "default_normalization_rate")]
    pub normalization_rate: f64,

    /// Entry names always treated as hidden, at any depth.
    #[builder(default = "default_exclude_names()")]
    #[serde(default = "default_exclude_names")]
    pub exclude_names: Vec<String>,

    /// Disable the dot-prefix / hidden-attribute rule. `exclude_names` still applies.
    #[builder(default = "false")]
    #[serde(default)]
    pub include_hidden: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of threads for scanning (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Time budget for the whole scan. Checked at the cancellation checkpoints.
    #[builder(default)]
    #[serde(default)]
    pub deadline: Option<Duration>,

    /// Hidden-entry rule family.
    #[builder(default)]
    #[serde(default)]
    pub platform: Platform,
}

fn default_stale_threshold_days() -> i64 {
    DEFAULT_STALE_THRESHOLD_DAYS
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_size_weight() -> f64 {
    DEFAULT_SIZE_WEIGHT
}

fn default_stale_weight() -> f64 {
    DEFAULT_STALE_WEIGHT
}

fn default_normalization_rate() -> f64 {
    DEFAULT_NORMALIZATION_RATE
}

fn check_factor(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be a finite, non-negative number (got {value})"));
    }
    Ok(())
}

fn check_threshold(days: i64) -> Result<(), String> {
    if days < 0 {
        return Err(format!("stale_threshold_days must not be negative (got {days})"));
    }
    Ok(())
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        if let Some(days) = self.stale_threshold_days {
            check_threshold(days)?;
        }
        if let Some(w) = self.size_weight {
            check_factor("size_weight", w)?;
        }
        if let Some(w) = self.stale_weight {
            check_factor("stale_weight", w)?;
        }
        if let Some(r) = self.normalization_rate {
            check_factor("normalization_rate", r)?;
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with default ranking parameters for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stale_threshold_days: DEFAULT_STALE_THRESHOLD_DAYS,
            top_k: DEFAULT_TOP_K,
            size_weight: DEFAULT_SIZE_WEIGHT,
            stale_weight: DEFAULT_STALE_WEIGHT,
            normalization_rate: DEFAULT_NORMALIZATION_RATE,
            exclude_names: default_exclude_names(),
            include_hidden: false,
            max_depth: None,
            threads: 0,
            deadline: None,
            platform: Platform::current(),
        }
    }

    /// Re-check invariants for configs that did not go through the builder,
    /// e.g. ones deserialized from a file.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.root.as_os_str().is_empty() {
            return Err(ScanError::invalid_config("Root path cannot be empty"));
        }
        check_threshold(self.stale_threshold_days).map_err(ScanError::invalid_config)?;
        check_factor("size_weight", self.size_weight).map_err(ScanError::invalid_config)?;
        check_factor("stale_weight", self.stale_weight).map_err(ScanError::invalid_config)?;
        check_factor("normalization_rate", self.normalization_rate)
            .map_err(ScanError::invalid_config)?;
        Ok(())
    }

    /// Check whether a name is on the always-excluded list.
    pub fn is_excluded_name(&self, name: &str) -> bool {
        if self.platform.case_insensitive_names() {
            self.exclude_names.iter().any(|n| n.eq_ignore_ascii_case(name))
        } else {
            self.exclude_names.iter().any(|n| n == name)
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

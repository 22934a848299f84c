//! Core types for blink.
//!
//! This crate provides the data shared by every stage of a scan: the
//! immutable [`FileRecord`] built for each regular file, the
//! [`ScanConfig`] that drives walking and ranking, running [`ScanStats`],
//! and the error/warning taxonomy.

mod config;
mod error;
mod platform;
mod record;
mod stats;

pub use config::{
    DEFAULT_NORMALIZATION_RATE, DEFAULT_SIZE_WEIGHT, DEFAULT_STALE_THRESHOLD_DAYS,
    DEFAULT_STALE_WEIGHT, DEFAULT_TOP_K, ScanConfig, ScanConfigBuilder,
};
pub use error::{ScanError, ScanWarning, WarningKind};
pub use platform::{Platform, default_exclude_names};
pub use record::{FileRecord, extension_of, staleness_days};
pub use stats::ScanStats;

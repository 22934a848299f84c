//! Per-file records produced by a scan.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One regular file observed during a scan.
///
/// Records are immutable once built; derived values such as the delete
/// priority live in wrapper types rather than on the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path, unique within a scan.
    pub path: PathBuf,
    /// Size in bytes at scan time.
    pub size: u64,
    /// Final suffix including the leading `.`, case preserved; empty if none.
    pub extension: CompactString,
    /// Last access time, if the platform reported one.
    pub accessed: Option<SystemTime>,
    /// Whole calendar days between the scan and the last access.
    /// `None` when the access time is missing or cannot be turned into a date.
    pub staleness_days: Option<i64>,
}

impl FileRecord {
    /// Build a record, deriving the extension and staleness against `now`.
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        accessed: Option<SystemTime>,
        now: DateTime<Local>,
    ) -> Self {
        let path = path.into();
        let extension = extension_of(&path);
        let staleness_days = accessed.and_then(|t| staleness_days(t, now));
        Self {
            path,
            size,
            extension,
            accessed,
            staleness_days,
        }
    }

    /// Whether the record belongs to an extension bucket.
    pub fn has_extension(&self) -> bool {
        !self.extension.is_empty()
    }

    /// Whether the file was last accessed more than `threshold_days` ago.
    /// Records with undefined staleness are never stale.
    pub fn is_stale(&self, threshold_days: i64) -> bool {
        self.staleness_days.is_some_and(|d| d > threshold_days)
    }
}

/// Extract the final suffix of a path, including the leading dot.
///
/// Dotfiles such as `.bashrc` and names ending in a bare dot have no suffix.
pub fn extension_of(path: &Path) -> CompactString {
    match path.extension() {
        Some(ext) if !ext.is_empty() => {
            let mut out = CompactString::const_new(".");
            out.push_str(&ext.to_string_lossy());
            out
        }
        _ => CompactString::default(),
    }
}

/// Convert a timestamp to a local date and count the days until `now`.
///
/// Returns `None` if the timestamp is outside the range chrono can represent
/// or falls on a later day than `now`.
pub fn staleness_days(accessed: SystemTime, now: DateTime<Local>) -> Option<i64> {
    let accessed = local_datetime(accessed)?;
    let days = (now.date_naive() - accessed.date_naive()).num_days();
    (days >= 0).then_some(days)
}

fn local_datetime(time: SystemTime) -> Option<DateTime<Local>> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (i64::try_from(d.as_secs()).ok()?, d.subsec_nanos()),
        Err(e) => (i64::try_from(e.duration().as_secs()).ok()?.checked_neg()?, 0),
    };
    DateTime::from_timestamp(secs, nanos).map(|utc| utc.with_timezone(&Local))
}

//! Directory scanning for blink.
//!
//! A scan is one pass over a directory tree:
//!
//! - **Walk** via jwalk, pruning hidden and excluded entries before descending
//! - **Stat** every regular file once, in parallel on rayon
//! - **Aggregate** into extension buckets and a size histogram
//! - **Rank** stale files into a deletion candidate list
//!
//! Per-entry failures never abort a scan; they are counted and returned as
//! warnings. Only a missing or unreadable root, cancellation, or an expired
//! deadline end it early.
//!
//! # Example
//!
//! ```rust,no_run
//! use blink_scan::{JwalkScanner, ScanConfig};
//!
//! let config = ScanConfig::new("/path/to/scan");
//! let result = JwalkScanner::new().scan(&config).unwrap();
//!
//! println!("Total size: {} bytes", result.total_bytes());
//! for candidate in &result.candidates {
//!     println!("{:.2} {}", candidate.priority, candidate.record.path.display());
//! }
//! ```
//!
//! # Progress and cancellation
//!
//! ```rust,no_run
//! use blink_scan::{JwalkScanner, ScanConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let scanner = JwalkScanner::new().with_cancel(token.clone());
//! let mut progress_rx = scanner.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(progress) = progress_rx.recv().await {
//!         println!("Scanned {} files", progress.files_scanned);
//!     }
//! });
//!
//! // token.cancel() from anywhere stops the scan with ScanError::Cancelled.
//! ```

mod aggregate;
mod builder;
mod cancel;
mod classifier;
mod progress;
mod result;
mod scanner;
mod walker;

pub use builder::build_record;
pub use classifier::{is_excluded, is_hidden};
pub use progress::{ScanPhase, ScanProgress};
pub use result::{HistogramRow, ScanReport, ScanResult};
pub use scanner::{JwalkScanner, scan};
pub use walker::{EntryKind, WalkEntry, Walker};

// Re-export core types for convenience
pub use blink_core::{Platform, ScanConfig, ScanError, ScanStats, ScanWarning, WarningKind};

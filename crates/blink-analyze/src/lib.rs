//! Aggregation and ranking for blink.
//!
//! This crate turns a stream of [`FileRecord`]s into the three views a scan
//! reports:
//!
//! - **Extension buckets** - total bytes per extension plus a heap of members
//! - **Size histogram** - file count and bytes over eleven fixed size bins
//! - **Delete ranking** - stale files scored by age and size, top K first
//!
//! Every aggregate has a `merge` that is associative and independent of
//! observation order, so partial results built on separate threads combine
//! into the same totals a sequential pass would produce.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use blink_analyze::{ExtensionIndex, Ranker, RankConfig, SizeHistogram};
//!
//! let mut index = ExtensionIndex::new();
//! let mut histogram = SizeHistogram::new();
//! for record in records.iter() {
//!     index.observe(Arc::clone(record));
//!     histogram.observe(record.size);
//! }
//!
//! for bucket in index.largest_n_extensions_by_size(5) {
//!     println!("{}: {} bytes", bucket.extension(), bucket.total_size());
//! }
//!
//! let candidates = Ranker::new(RankConfig::default()).rank(&records);
//! ```

mod buckets;
mod histogram;
mod ranker;

pub use buckets::{BucketSummary, ExtensionBucket, ExtensionIndex, MemberOrder};
pub use histogram::{BinPercent, BinTotals, SizeBin, SizeHistogram};
pub use ranker::{DeleteCandidate, RankConfig, RankConfigBuilder, Ranker};

// Re-export core types
pub use blink_core::FileRecord;

//! Per-extension aggregation of file records.
//!
//! Every record with a non-empty extension lands in exactly one
//! [`ExtensionBucket`], which keeps a running byte total and a heap of its
//! members. Extensionless files are only counted, never bucketed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use blink_core::FileRecord;

/// Which key orders the members of a bucket. The member with the largest key
/// is popped first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberOrder {
    /// Largest file first.
    #[default]
    BySize,
    /// Longest-unaccessed file first. Undefined staleness sorts last.
    ByStaleness,
}

impl MemberOrder {
    /// Ordering key for a record under this policy.
    pub fn key(self, record: &FileRecord) -> u64 {
        match self {
            Self::BySize => record.size,
            Self::ByStaleness => record
                .staleness_days
                .map_or(0, |d| u64::try_from(d).unwrap_or(0)),
        }
    }
}

/// Heap slot: the precomputed key plus the record.
///
/// Ordered by `key` ascending, then by path descending, so that
/// `BinaryHeap` (a max-heap) yields the largest key first and, among equal
/// keys, the lexicographically smallest path first.
#[derive(Debug, Clone)]
struct Member {
    key: u64,
    record: Arc<FileRecord>,
}

impl Ord for Member {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| other.record.path.cmp(&self.record.path))
    }
}

impl PartialOrd for Member {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Member {}

/// Aggregate for one extension.
#[derive(Debug, Clone)]
pub struct ExtensionBucket {
    extension: CompactString,
    order: MemberOrder,
    total_size: u64,
    members: BinaryHeap<Member>,
}

impl ExtensionBucket {
    /// Create an empty bucket whose members are ordered by `order`.
    pub fn new(extension: impl Into<CompactString>, order: MemberOrder) -> Self {
        Self {
            extension: extension.into(),
            order,
            total_size: 0,
            members: BinaryHeap::new(),
        }
    }

    /// The extension this bucket aggregates, including the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Sum of member sizes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if the bucket has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Member ordering policy.
    pub fn order(&self) -> MemberOrder {
        self.order
    }

    /// Add a record.
    pub fn push(&mut self, record: Arc<FileRecord>) {
        self.total_size += record.size;
        self.members.push(Member {
            key: self.order.key(&record),
            record,
        });
    }

    /// The member with the largest key, without removing it.
    pub fn peek_largest(&self) -> Option<&Arc<FileRecord>> {
        self.members.peek().map(|m| &m.record)
    }

    /// Remove and return the member with the largest key.
    pub fn pop_largest(&mut self) -> Option<Arc<FileRecord>> {
        let member = self.members.pop()?;
        self.total_size -= member.record.size;
        Some(member.record)
    }

    /// All members in pop order, without consuming the bucket.
    pub fn members_sorted(&self) -> Vec<&Arc<FileRecord>> {
        let mut members: Vec<&Member> = self.members.iter().collect();
        members.sort_unstable_by(|a, b| b.cmp(a));
        members.into_iter().map(|m| &m.record).collect()
    }

    /// Fold another bucket for the same extension into this one.
    fn absorb(&mut self, other: ExtensionBucket) {
        debug_assert_eq!(self.extension, other.extension);
        self.total_size += other.total_size;
        if self.order == other.order {
            let mut members = other.members;
            self.members.append(&mut members);
        } else {
            for member in other.members {
                self.members.push(Member {
                    key: self.order.key(&member.record),
                    record: member.record,
                });
            }
        }
    }
}

/// Serializable view of a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketSummary {
    /// Extension including the leading dot.
    pub extension: String,
    /// Sum of member sizes.
    pub total_size: u64,
    /// Number of members.
    pub file_count: usize,
    /// Leading members in pop order.
    pub top_files: Vec<(PathBuf, u64)>,
}

/// Mapping from extension to bucket.
#[derive(Debug, Clone, Default)]
pub struct ExtensionIndex {
    order: MemberOrder,
    buckets: HashMap<CompactString, ExtensionBucket>,
    extensionless_files: u64,
    extensionless_bytes: u64,
}

impl ExtensionIndex {
    /// Create an empty index ordering members by size.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with an explicit member ordering.
    pub fn with_order(order: MemberOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// Add a record to the bucket for its extension, creating the bucket on
    /// first sight. Extensionless records are only counted.
    pub fn observe(&mut self, record: Arc<FileRecord>) {
        if !record.has_extension() {
            self.extensionless_files += 1;
            self.extensionless_bytes += record.size;
            return;
        }
        let order = self.order;
        self.buckets
            .entry(record.extension.clone())
            .or_insert_with(|| ExtensionBucket::new(record.extension.clone(), order))
            .push(record);
    }

    /// Look up a bucket by extension (leading dot included).
    pub fn get(&self, extension: &str) -> Option<&ExtensionBucket> {
        self.buckets.get(extension)
    }

    /// Mutable lookup, e.g. to pop members.
    pub fn get_mut(&mut self, extension: &str) -> Option<&mut ExtensionBucket> {
        self.buckets.get_mut(extension)
    }

    /// Number of distinct extensions.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no extension has been observed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate buckets in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionBucket> {
        self.buckets.values()
    }

    /// Files without an extension.
    pub fn extensionless_files(&self) -> u64 {
        self.extensionless_files
    }

    /// Bytes held by files without an extension.
    pub fn extensionless_bytes(&self) -> u64 {
        self.extensionless_bytes
    }

    /// Bytes in buckets plus extensionless bytes.
    pub fn total_bytes(&self) -> u64 {
        self.bucketed_bytes() + self.extensionless_bytes
    }

    /// Bytes held in buckets.
    pub fn bucketed_bytes(&self) -> u64 {
        self.buckets.values().map(|b| b.total_size).sum()
    }

    /// The `n` extensions with the largest total size, descending, ties broken
    /// by extension ascending.
    pub fn largest_n_extensions_by_size(&self, n: usize) -> Vec<&ExtensionBucket> {
        let mut buckets: Vec<&ExtensionBucket> = self.buckets.values().collect();
        buckets.sort_unstable_by(|a, b| {
            b.total_size
                .cmp(&a.total_size)
                .then_with(|| a.extension.cmp(&b.extension))
        });
        buckets.truncate(n);
        buckets
    }

    /// Summaries of the `n` largest extensions with up to `files_per_bucket`
    /// members each.
    pub fn summaries(&self, n: usize, files_per_bucket: usize) -> Vec<BucketSummary> {
        self.largest_n_extensions_by_size(n)
            .into_iter()
            .map(|bucket| BucketSummary {
                extension: bucket.extension.to_string(),
                total_size: bucket.total_size,
                file_count: bucket.len(),
                top_files: bucket
                    .members_sorted()
                    .into_iter()
                    .take(files_per_bucket)
                    .map(|r| (r.path.clone(), r.size))
                    .collect(),
            })
            .collect()
    }

    /// Fold a partial index into this one.
    pub fn merge(&mut self, other: ExtensionIndex) {
        self.extensionless_files += other.extensionless_files;
        self.extensionless_bytes += other.extensionless_bytes;
        for (extension, bucket) in other.buckets {
            match self.buckets.get_mut(&extension) {
                Some(existing) => existing.absorb(bucket),
                None => {
                    let mut fresh = ExtensionBucket::new(extension.clone(), self.order);
                    fresh.absorb(bucket);
                    self.buckets.insert(extension, fresh);
                }
            }
        }
    }
}

//! Size-bin histogram over the fixed byte ranges.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoEnumIterator};

const KB: u64 = 1 << 10;
const MB: u64 = 1 << 20;
const GB: u64 = 1 << 30;

/// One of the eleven fixed, ordered size ranges.
///
/// Ranges are half-open, `[lower, upper)`, in base-1024 units.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
)]
pub enum SizeBin {
    #[strum(to_string = "0-1KB")]
    UpTo1K,
    #[strum(to_string = "1KB-100KB")]
    UpTo100K,
    #[strum(to_string = "100KB-500KB")]
    UpTo500K,
    #[strum(to_string = "500KB-1MB")]
    UpTo1M,
    #[strum(to_string = "1MB-5MB")]
    UpTo5M,
    #[strum(to_string = "5MB-50MB")]
    UpTo50M,
    #[strum(to_string = "50MB-100MB")]
    UpTo100M,
    #[strum(to_string = "100MB-500MB")]
    UpTo500M,
    #[strum(to_string = "500MB-1GB")]
    UpTo1G,
    #[strum(to_string = "1GB-10GB")]
    UpTo10G,
    #[strum(to_string = ">10GB")]
    Over10G,
}

impl SizeBin {
    /// Position of the bin in the declared order.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inclusive lower bound in bytes.
    pub fn lower_bound(self) -> u64 {
        match self {
            Self::UpTo1K => 0,
            Self::UpTo100K => KB,
            Self::UpTo500K => 100 * KB,
            Self::UpTo1M => 500 * KB,
            Self::UpTo5M => MB,
            Self::UpTo50M => 5 * MB,
            Self::UpTo100M => 50 * MB,
            Self::UpTo500M => 100 * MB,
            Self::UpTo1G => 500 * MB,
            Self::UpTo10G => GB,
            Self::Over10G => 10 * GB,
        }
    }

    /// Exclusive upper bound in bytes; `None` for the open-ended last bin.
    pub fn upper_bound(self) -> Option<u64> {
        Self::iter()
            .nth(self.index() + 1)
            .map(SizeBin::lower_bound)
    }

    /// The bin a file of `bytes` belongs to.
    pub fn classify(bytes: u64) -> Self {
        Self::iter()
            .rev()
            .find(|bin| bytes >= bin.lower_bound())
            .unwrap_or(Self::UpTo1K)
    }
}

/// Count and byte total for one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinTotals {
    pub bin: SizeBin,
    pub count: u64,
    pub total_bytes: u64,
}

/// Share of files and bytes for one bin, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinPercent {
    pub bin: SizeBin,
    pub count_percent: f64,
    pub bytes_percent: f64,
}

/// File count and total size per size bin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeHistogram {
    counts: [u64; SizeBin::COUNT],
    bytes: [u64; SizeBin::COUNT],
}

impl SizeHistogram {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a file of `size` bytes.
    pub fn observe(&mut self, size: u64) {
        let i = SizeBin::classify(size).index();
        self.counts[i] += 1;
        self.bytes[i] += size;
    }

    /// Absolute totals in declared bin order.
    pub fn bins(&self) -> Vec<BinTotals> {
        SizeBin::iter()
            .map(|bin| BinTotals {
                bin,
                count: self.counts[bin.index()],
                total_bytes: self.bytes[bin.index()],
            })
            .collect()
    }

    /// Totals for a single bin.
    pub fn get(&self, bin: SizeBin) -> BinTotals {
        BinTotals {
            bin,
            count: self.counts[bin.index()],
            total_bytes: self.bytes[bin.index()],
        }
    }

    /// Number of files observed.
    pub fn total_files(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Bytes observed.
    pub fn total_bytes(&self) -> u64 {
        self.bytes.iter().sum()
    }

    /// Each bin's share of files and bytes.
    ///
    /// A metric whose grand total is zero reports 0% for every bin; an empty
    /// scan is a valid result, not an error.
    pub fn to_percentages(&self) -> Vec<BinPercent> {
        let files = self.total_files();
        let bytes = self.total_bytes();
        SizeBin::iter()
            .map(|bin| BinPercent {
                bin,
                count_percent: percent(self.counts[bin.index()], files),
                bytes_percent: percent(self.bytes[bin.index()], bytes),
            })
            .collect()
    }

    /// Running totals walked in declared bin order, smallest range first.
    pub fn to_cumulative(&self) -> Vec<BinTotals> {
        let mut count = 0;
        let mut total_bytes = 0;
        SizeBin::iter()
            .map(|bin| {
                count += self.counts[bin.index()];
                total_bytes += self.bytes[bin.index()];
                BinTotals {
                    bin,
                    count,
                    total_bytes,
                }
            })
            .collect()
    }

    /// Running percentages in declared bin order.
    pub fn to_cumulative_percentages(&self) -> Vec<BinPercent> {
        let files = self.total_files();
        let bytes = self.total_bytes();
        self.to_cumulative()
            .into_iter()
            .map(|t| BinPercent {
                bin: t.bin,
                count_percent: percent(t.count, files),
                bytes_percent: percent(t.total_bytes, bytes),
            })
            .collect()
    }

    /// Fold a partial histogram into this one.
    pub fn merge(&mut self, other: &SizeHistogram) {
        for i in 0..SizeBin::COUNT {
            self.counts[i] += other.counts[i];
            self.bytes[i] += other.bytes[i];
        }
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(SizeBin::classify(0), SizeBin::UpTo1K);
        assert_eq!(SizeBin::classify(KB - 1), SizeBin::UpTo1K);
        assert_eq!(SizeBin::classify(KB), SizeBin::UpTo100K);
        assert_eq!(SizeBin::classify(100 * KB), SizeBin::UpTo500K);
        assert_eq!(SizeBin::classify(MB - 1), SizeBin::UpTo1M);
        assert_eq!(SizeBin::classify(MB), SizeBin::UpTo5M);
        assert_eq!(SizeBin::classify(2_000_000), SizeBin::UpTo5M);
        assert_eq!(SizeBin::classify(GB), SizeBin::UpTo10G);
        assert_eq!(SizeBin::classify(10 * GB), SizeBin::Over10G);
        assert_eq!(SizeBin::classify(u64::MAX), SizeBin::Over10G);
    }

    #[test]
    fn test_bins_are_contiguous() {
        let bins: Vec<SizeBin> = SizeBin::iter().collect();
        assert_eq!(bins.len(), 11);
        for pair in bins.windows(2) {
            assert_eq!(pair[0].upper_bound(), Some(pair[1].lower_bound()));
        }
        assert_eq!(SizeBin::Over10G.upper_bound(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(SizeBin::UpTo1K.to_string(), "0-1KB");
        assert_eq!(SizeBin::UpTo500M.to_string(), "100MB-500MB");
        assert_eq!(SizeBin::Over10G.to_string(), ">10GB");
    }

    #[test]
    fn test_observe_and_cumulative() {
        let mut hist = SizeHistogram::new();
        hist.observe(10);
        hist.observe(500);
        hist.observe(2 * KB);
        hist.observe(3 * MB);

        assert_eq!(hist.total_files(), 4);
        assert_eq!(hist.total_bytes(), 510 + 2 * KB + 3 * MB);
        assert_eq!(hist.get(SizeBin::UpTo1K).count, 2);
        assert_eq!(hist.get(SizeBin::UpTo1K).total_bytes, 510);

        let cumulative = hist.to_cumulative();
        assert_eq!(cumulative.len(), 11);
        for pair in cumulative.windows(2) {
            assert!(pair[0].count <= pair[1].count);
            assert!(pair[0].total_bytes <= pair[1].total_bytes);
        }
        let last = cumulative.last().unwrap();
        assert_eq!(last.count, hist.total_files());
        assert_eq!(last.total_bytes, hist.total_bytes());
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let mut hist = SizeHistogram::new();
        for size in [1, 2_000, 200_000, 700_000, 40 * MB, 600 * MB] {
            hist.observe(size);
        }
        let pct = hist.to_percentages();
        let count_sum: f64 = pct.iter().map(|p| p.count_percent).sum();
        let bytes_sum: f64 = pct.iter().map(|p| p.bytes_percent).sum();
        assert!((count_sum - 100.0).abs() < 1e-9);
        assert!((bytes_sum - 100.0).abs() < 1e-9);

        let cumulative = hist.to_cumulative_percentages();
        assert!((cumulative.last().unwrap().count_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_histogram_reports_zero() {
        let hist = SizeHistogram::new();
        assert!(hist.to_percentages().iter().all(|p| p.count_percent == 0.0 && p.bytes_percent == 0.0));
        assert!(hist
            .to_cumulative_percentages()
            .iter()
            .all(|p| p.count_percent == 0.0));
    }

    #[test]
    fn test_only_empty_files() {
        let mut hist = SizeHistogram::new();
        hist.observe(0);
        hist.observe(0);
        let pct = hist.to_percentages();
        assert_eq!(pct[0].count_percent, 100.0);
        assert!(pct.iter().all(|p| p.bytes_percent == 0.0));
    }

    #[test]
    fn test_merge() {
        let mut a = SizeHistogram::new();
        a.observe(5);
        let mut b = SizeHistogram::new();
        b.observe(5 * MB);
        b.observe(7);
        a.merge(&b);
        assert_eq!(a.total_files(), 3);
        assert_eq!(a.get(SizeBin::UpTo1K).count, 2);
        assert_eq!(a.get(SizeBin::UpTo50M).count, 1);
    }
}

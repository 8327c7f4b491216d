//! Multi-dimensional sparse counting histograms

use crate::{numeric::Float, Result};

use eyre::ensure;

use std::{collections::BTreeMap, fmt};

/// Uniform binning of one histogram axis
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Binning {
    /// Number of bins, excluding underflow and overflow
    pub bins: usize,

    /// Lower edge of the first bin
    pub min: Float,

    /// Upper edge of the last bin
    pub max: Float,
}
//
impl Binning {
    /// Describe a uniform binning
    pub const fn new(bins: usize, min: Float, max: Float) -> Self {
        Self { bins, min, max }
    }

    /// Check that this binning makes sense
    pub fn validate(&self) -> Result<()> {
        ensure!(self.bins > 0, "An axis needs at least one bin");
        ensure!(
            self.min.is_finite() && self.max.is_finite() && self.min < self.max,
            "Axis range [{}, {}] is not a finite, non-empty interval",
            self.min,
            self.max
        );
        Ok(())
    }

    /// Index of the bin containing a value
    ///
    /// Bin 0 is the underflow bin and bin `bins + 1` the overflow bin. Values
    /// which cannot be binned (NaN) are sent to the overflow bin.
    ///
    pub fn find_bin(&self, value: Float) -> u32 {
        let overflow = self.bins as u32 + 1;
        if value.is_nan() || value >= self.max {
            overflow
        } else if value < self.min {
            0
        } else {
            let fraction = (value - self.min) / (self.max - self.min);
            // Rounding can push values just below max into the overflow bin
            (1 + (fraction * self.bins as Float) as u32).min(self.bins as u32)
        }
    }
}
//
impl fmt::Display for Binning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bins in [{}, {}]", self.bins, self.min, self.max)
    }
}

/// Titled histogram axis
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    /// Human-readable description of the binned quantity
    pub title: &'static str,

    /// Binning of the axis
    pub binning: Binning,
}

/// Coordinates of a histogram bin, one index per axis
pub type BinIndex = Box<[u32]>;

/// Sparse N-dimensional histogram of unweighted counts
///
/// Only non-empty bins are stored, which keeps memory usage proportional to
/// the number of distinct filled bins rather than to the product of the axis
/// sizes.
///
#[derive(Clone, Debug, PartialEq)]
pub struct SparseHistogram {
    name: String,
    title: String,
    axes: Vec<Axis>,
    counts: BTreeMap<BinIndex, u64>,
    entries: u64,
}
//
impl SparseHistogram {
    /// Create an empty histogram
    pub fn new(name: impl Into<String>, title: impl Into<String>, axes: Vec<Axis>) -> Self {
        assert!(!axes.is_empty(), "A histogram needs at least one axis");
        Self {
            name: name.into(),
            title: title.into(),
            axes,
            counts: BTreeMap::new(),
            entries: 0,
        }
    }

    /// Name of the histogram
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Title of the histogram
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Axes of the histogram
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Number of fill operations, including out-of-range ones
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Compute the bin coordinates of a point
    pub fn find_bin(&self, point: &[Float]) -> BinIndex {
        assert_eq!(
            point.len(),
            self.axes.len(),
            "Point dimension does not match histogram {}",
            self.name
        );
        self.axes
            .iter()
            .zip(point)
            .map(|(axis, &x)| axis.binning.find_bin(x))
            .collect()
    }

    /// Count one more entry at a given point
    pub fn fill(&mut self, point: &[Float]) {
        let bin = self.find_bin(point);
        *self.counts.entry(bin).or_insert(0) += 1;
        self.entries += 1;
    }

    /// Number of entries in a given bin
    #[cfg(test)]
    pub fn bin_content(&self, bin: &[u32]) -> u64 {
        self.counts.get(bin).copied().unwrap_or(0)
    }

    /// Iterate over non-empty bins, in lexicographic order of bin index
    pub fn iter(&self) -> impl Iterator<Item = (&[u32], u64)> + '_ {
        self.counts.iter().map(|(bin, &count)| (&bin[..], count))
    }

    /// Add the counts of another histogram with the same layout
    pub fn merge(&mut self, other: Self) {
        assert_eq!(self.name, other.name, "Cannot merge distinct histograms");
        assert_eq!(self.axes, other.axes, "Cannot merge histograms of different layout");
        for (bin, count) in other.counts {
            *self.counts.entry(bin).or_insert(0) += count;
        }
        self.entries += other.entries;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_hist() -> SparseHistogram {
        SparseHistogram::new(
            "test",
            "Test histogram",
            vec![
                Axis {
                    title: "x",
                    binning: Binning::new(10, 0., 1.),
                },
                Axis {
                    title: "flag",
                    binning: Binning::new(2, -0.5, 1.5),
                },
            ],
        )
    }

    #[test]
    fn bin_lookup() {
        let binning = Binning::new(4, -1., 1.);
        assert_eq!(binning.find_bin(-1.5), 0);
        assert_eq!(binning.find_bin(-1.), 1);
        assert_eq!(binning.find_bin(-0.01), 2);
        assert_eq!(binning.find_bin(0.), 3);
        assert_eq!(binning.find_bin(1. - Float::EPSILON), 4);
        assert_eq!(binning.find_bin(1.), 5);
        assert_eq!(binning.find_bin(Float::NAN), 5);
    }

    #[test]
    fn binning_validation() {
        assert!(Binning::new(20, -1., 1.).validate().is_ok());
        assert!(Binning::new(0, -1., 1.).validate().is_err());
        assert!(Binning::new(10, 1., 1.).validate().is_err());
        assert!(Binning::new(10, 2., 1.).validate().is_err());
        assert!(Binning::new(10, 0., Float::INFINITY).validate().is_err());
    }

    #[test]
    fn fill_and_read_back() {
        let mut hist = test_hist();
        hist.fill(&[0.05, 0.]);
        hist.fill(&[0.05, 0.]);
        hist.fill(&[0.55, 1.]);
        hist.fill(&[3., 1.]);
        assert_eq!(hist.entries(), 4);
        assert_eq!(hist.bin_content(&[1, 1]), 2);
        assert_eq!(hist.bin_content(&[6, 2]), 1);
        assert_eq!(hist.bin_content(&[11, 2]), 1);
        assert_eq!(hist.bin_content(&[2, 1]), 0);
        let bins = hist.iter().map(|(bin, _)| bin.to_vec()).collect::<Vec<_>>();
        assert_eq!(bins, vec![vec![1, 1], vec![6, 2], vec![11, 2]]);
    }

    #[test]
    #[should_panic]
    fn fill_with_wrong_dimension() {
        test_hist().fill(&[0.5]);
    }

    #[test]
    fn merge_adds_counts() {
        let mut hist1 = test_hist();
        hist1.fill(&[0.05, 0.]);
        let mut hist2 = test_hist();
        hist2.fill(&[0.05, 0.]);
        hist2.fill(&[0.95, 1.]);
        hist1.merge(hist2);
        assert_eq!(hist1.entries(), 3);
        assert_eq!(hist1.bin_content(&[1, 1]), 2);
        assert_eq!(hist1.bin_content(&[10, 2]), 1);
    }
}

//! Per-band binned histograms over pixel regions.
//!
//! A [`Histogram`] has fixed geometry: band count, bin count per band and a
//! half-open value range `[low, high)` per band. Bin `i` of band `b` covers
//! `[low + i*bw, low + (i+1)*bw)` where `bw = (high - low) / num_bins`.
//!
//! # Counting
//!
//! [`Histogram::count_pixels`] scans a [`PixelRegion`](pixkern_core::PixelRegion)
//! on a [`SampleGrid`], optionally restricted by an ROI. Each call fills
//! private per-band bins and merges them into the shared bins under a lock,
//! so several threads may count into one histogram at once.
//!
//! # Cached statistics
//!
//! [`totals`](Histogram::totals) and [`mean`](Histogram::mean) are computed
//! on first use and then kept. Later `count_pixels` calls do **not** refresh
//! them: query statistics only after counting is complete, or call
//! [`reset_statistics`](Histogram::reset_statistics) to drop the cache.
//!
//! # Example
//!
//! ```rust
//! use pixkern_core::{PixelRegion, Rect};
//! use pixkern_stats::{Histogram, SampleGrid};
//!
//! let hist = Histogram::uniform(4, 0.0, 4.0, 1).unwrap();
//! let region = PixelRegion::interleaved(Rect::from_size(4, 1), 1, vec![0u8, 1, 2, 3]).unwrap();
//! hist.count_pixels(&region, None, SampleGrid::default()).unwrap();
//!
//! assert_eq!(hist.band_bins(0), vec![1, 1, 1, 1]);
//! assert_eq!(hist.totals(), &[4]);
//! assert_eq!(hist.mean(), &[1.5]);
//! ```

mod count;
mod moments;
mod smooth;
mod threshold;

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use pixkern_core::{Error, Result};

pub use count::SampleGrid;
pub use threshold::ThresholdMethod;

/// Multi-band histogram with lazily allocated bins and cached statistics.
#[derive(Debug)]
pub struct Histogram {
    num_bins: Vec<usize>,
    low: Vec<f64>,
    high: Vec<f64>,
    bin_width: Vec<f64>,
    /// Allocated on first count or query.
    bins: Mutex<Option<Vec<Vec<u32>>>>,
    totals: OnceLock<Vec<u64>>,
    mean: OnceLock<Vec<f64>>,
}

impl Clone for Histogram {
    fn clone(&self) -> Self {
        let bins = self.lock_bins().clone();
        Self {
            num_bins: self.num_bins.clone(),
            low: self.low.clone(),
            high: self.high.clone(),
            bin_width: self.bin_width.clone(),
            bins: Mutex::new(bins),
            totals: self.totals.clone(),
            mean: self.mean.clone(),
        }
    }
}

impl Histogram {
    /// Creates a histogram with one band per array element.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the arrays are empty or differ in
    /// length, any bin count is zero, or any `low >= high`.
    pub fn new(num_bins: &[usize], low: &[f64], high: &[f64]) -> Result<Self> {
        if num_bins.is_empty() {
            return Err(Error::invalid_argument("num_bins must not be empty"));
        }
        if low.len() != num_bins.len() || high.len() != num_bins.len() {
            return Err(Error::invalid_argument(format!(
                "array lengths differ: num_bins {}, low {}, high {}",
                num_bins.len(),
                low.len(),
                high.len()
            )));
        }
        Self::from_parts(num_bins.to_vec(), low.to_vec(), high.to_vec())
    }

    /// Creates a histogram with `num_bands` bands.
    ///
    /// Band `b` takes element `b` of each array, or element 0 when the array
    /// is shorter.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `num_bands` is zero, any array is
    /// empty, or a resulting band has zero bins or `low >= high`.
    pub fn with_bands(
        num_bins: &[usize],
        low: &[f64],
        high: &[f64],
        num_bands: usize,
    ) -> Result<Self> {
        if num_bands == 0 {
            return Err(Error::invalid_argument("num_bands must be positive"));
        }
        if num_bins.is_empty() || low.is_empty() || high.is_empty() {
            return Err(Error::invalid_argument(
                "num_bins, low and high must each have at least one element",
            ));
        }
        Self::from_parts(
            pad(num_bins, num_bands),
            pad(low, num_bands),
            pad(high, num_bands),
        )
    }

    /// Creates a histogram whose bands all share one geometry.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `num_bands` or `num_bins` is zero or
    /// `low >= high`.
    pub fn uniform(num_bins: usize, low: f64, high: f64, num_bands: usize) -> Result<Self> {
        Self::with_bands(&[num_bins], &[low], &[high], num_bands)
    }

    fn from_parts(num_bins: Vec<usize>, low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        for (band, &n) in num_bins.iter().enumerate() {
            if n == 0 {
                return Err(Error::invalid_argument(format!(
                    "band {band}: number of bins must be positive"
                )));
            }
        }
        for (band, (&lo, &hi)) in low.iter().zip(&high).enumerate() {
            if !(lo < hi) {
                return Err(Error::invalid_argument(format!(
                    "band {band}: low value {lo} must be less than high value {hi}"
                )));
            }
        }
        let bin_width = num_bins
            .iter()
            .zip(low.iter().zip(&high))
            .map(|(&n, (&lo, &hi))| (hi - lo) / n as f64)
            .collect();

        Ok(Self {
            num_bins,
            low,
            high,
            bin_width,
            bins: Mutex::new(None),
            totals: OnceLock::new(),
            mean: OnceLock::new(),
        })
    }

    /// Creates an empty histogram with the same geometry.
    pub(crate) fn empty_like(&self) -> Self {
        Self {
            num_bins: self.num_bins.clone(),
            low: self.low.clone(),
            high: self.high.clone(),
            bin_width: self.bin_width.clone(),
            bins: Mutex::new(None),
            totals: OnceLock::new(),
            mean: OnceLock::new(),
        }
    }

    /// Number of bands.
    #[inline]
    pub fn num_bands(&self) -> usize {
        self.num_bins.len()
    }

    /// Bin counts of all bands.
    #[inline]
    pub fn num_bins(&self) -> &[usize] {
        &self.num_bins
    }

    /// Bin count of `band`.
    ///
    /// # Panics
    ///
    /// Panics if `band >= num_bands()`.
    #[inline]
    pub fn num_bins_of(&self, band: usize) -> usize {
        self.num_bins[band]
    }

    /// Inclusive lower bounds of all bands.
    #[inline]
    pub fn low_values(&self) -> &[f64] {
        &self.low
    }

    /// Exclusive upper bounds of all bands.
    #[inline]
    pub fn high_values(&self) -> &[f64] {
        &self.high
    }

    /// Width of one bin of `band`.
    ///
    /// # Panics
    ///
    /// Panics if `band >= num_bands()`.
    #[inline]
    pub fn bin_width(&self, band: usize) -> f64 {
        self.bin_width[band]
    }

    /// Lower bound of `bin` in `band`.
    ///
    /// # Panics
    ///
    /// Panics if `band >= num_bands()`.
    #[inline]
    pub fn bin_low_value(&self, band: usize, bin: usize) -> f64 {
        self.low[band] + bin as f64 * self.bin_width[band]
    }

    /// Copy of all bins, `[band][bin]`.
    pub fn bins(&self) -> Vec<Vec<u32>> {
        self.with_bins(|bins| bins.to_vec())
    }

    /// Copy of the bins of `band`.
    ///
    /// # Panics
    ///
    /// Panics if `band >= num_bands()`.
    pub fn band_bins(&self, band: usize) -> Vec<u32> {
        self.with_bins(|bins| bins[band].clone())
    }

    /// Count in `bin` of `band`.
    ///
    /// # Panics
    ///
    /// Panics if `band` or `bin` is out of range.
    pub fn bin_size(&self, band: usize, bin: usize) -> u32 {
        self.with_bins(|bins| bins[band][bin])
    }

    /// Sum of the counts of bins `min_bin..=max_bin` in `band`.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexOutOfRange`] if `band` or `max_bin` is out of range
    /// - [`Error::InvalidArgument`] if `min_bin > max_bin`
    pub fn sub_total(&self, band: usize, min_bin: usize, max_bin: usize) -> Result<u64> {
        if band >= self.num_bands() {
            return Err(Error::index_out_of_range(band, self.num_bands()));
        }
        let n = self.num_bins[band];
        if min_bin >= n {
            return Err(Error::index_out_of_range(min_bin, n));
        }
        if max_bin >= n {
            return Err(Error::index_out_of_range(max_bin, n));
        }
        if min_bin > max_bin {
            return Err(Error::invalid_argument(format!(
                "min bin {min_bin} is greater than max bin {max_bin}"
            )));
        }
        Ok(self.with_bins(|bins| {
            bins[band][min_bin..=max_bin]
                .iter()
                .map(|&c| u64::from(c))
                .sum()
        }))
    }

    /// Zeroes every bin, keeping geometry and cached statistics.
    pub fn clear_histogram(&self) {
        let mut guard = self.lock_bins();
        if let Some(bins) = guard.as_mut() {
            for band in bins.iter_mut() {
                band.fill(0);
            }
        }
    }

    /// Drops cached totals and means so they are recomputed on next use.
    pub fn reset_statistics(&mut self) {
        self.totals = OnceLock::new();
        self.mean = OnceLock::new();
    }

    fn lock_bins(&self) -> MutexGuard<'_, Option<Vec<Vec<u32>>>> {
        // Counts stay consistent even if a counting thread panicked.
        self.bins.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the bins, allocating them if needed.
    pub(crate) fn with_bins<R>(&self, f: impl FnOnce(&[Vec<u32>]) -> R) -> R {
        let mut guard = self.lock_bins();
        let bins = guard.get_or_insert_with(|| self.zero_bins());
        f(bins)
    }

    pub(crate) fn with_bins_mut<R>(&self, f: impl FnOnce(&mut [Vec<u32>]) -> R) -> R {
        let mut guard = self.lock_bins();
        let bins = guard.get_or_insert_with(|| self.zero_bins());
        f(bins)
    }

    fn zero_bins(&self) -> Vec<Vec<u32>> {
        self.num_bins.iter().map(|&n| vec![0; n]).collect()
    }

    /// Level of bin `b` as accumulated by repeated `+= bw` from `low`.
    ///
    /// Statistics walk bins in order; this yields the same sequence.
    pub(crate) fn levels(&self, band: usize) -> impl Iterator<Item = f64> {
        let bw = self.bin_width[band];
        let n = self.num_bins[band];
        std::iter::successors(Some(self.low[band]), move |l| Some(l + bw)).take(n)
    }
}

fn pad<T: Copy>(values: &[T], num_bands: usize) -> Vec<T> {
    (0..num_bands)
        .map(|b| values.get(b).copied().unwrap_or(values[0]))
        .collect()
}

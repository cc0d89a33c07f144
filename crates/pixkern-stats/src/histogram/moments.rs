//! Totals, mean, moments, standard deviation and entropy.
//!
//! Every statistic treats the lower bound of a bin as the level of all its
//! samples. Bands with no counts yield `NaN` for the ratio-based values.

use pixkern_core::{Error, Result};
#[allow(unused_imports)]
use tracing::{debug, trace};

use super::Histogram;

impl Histogram {
    /// Per-band sample counts.
    ///
    /// Computed once and cached; see [`reset_statistics`](Histogram::reset_statistics).
    pub fn totals(&self) -> &[u64] {
        self.totals.get_or_init(|| {
            self.with_bins(|bins| {
                bins.iter()
                    .map(|band| band.iter().map(|&c| u64::from(c)).sum())
                    .collect()
            })
        })
    }

    /// Per-band mean level, `sum(counts[b] / total * level(b))`.
    ///
    /// Computed once and cached; see [`reset_statistics`](Histogram::reset_statistics).
    pub fn mean(&self) -> &[f64] {
        self.mean.get_or_init(|| {
            let totals = self.totals();
            self.with_bins(|bins| {
                (0..self.num_bands())
                    .map(|band| {
                        let total = totals[band] as f64;
                        bins[band]
                            .iter()
                            .zip(self.levels(band))
                            .map(|(&c, level)| c as f64 / total * level)
                            .sum()
                    })
                    .collect()
            })
        })
    }

    /// Moment of order `order` for every band.
    ///
    /// `central` measures `|level - mean|^order`, so central moments are
    /// never negative. `absolute` takes `|level|^order` for the raw moments.
    /// The first non-absolute, non-central moment is
    /// [`mean`](Histogram::mean) and the first central moment is zero.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `order < 1`.
    pub fn moment(&self, order: i32, absolute: bool, central: bool) -> Result<Vec<f64>> {
        if order < 1 {
            return Err(Error::invalid_argument(format!(
                "moment order must be at least 1, got {order}"
            )));
        }
        if order == 1 && !absolute && !central {
            return Ok(self.mean().to_vec());
        }
        if order == 1 && central {
            return Ok(vec![0.0; self.num_bands()]);
        }
        Ok(self.moment_unchecked(order, absolute, central))
    }

    fn moment_unchecked(&self, order: i32, absolute: bool, central: bool) -> Vec<f64> {
        let totals = self.totals();
        let mean = self.mean();
        self.with_bins(|bins| {
            (0..self.num_bands())
                .map(|band| {
                    let total = totals[band] as f64;
                    let reference = if central { mean[band] } else { 0.0 };
                    bins[band]
                        .iter()
                        .zip(self.levels(band))
                        .map(|(&c, level)| {
                            let d = level - reference;
                            let m = if absolute || central {
                                d.abs().powi(order)
                            } else {
                                d.powi(order)
                            };
                            m * (c as f64 / total)
                        })
                        .sum()
                })
                .collect()
        })
    }

    /// Per-band standard deviation, `sqrt(m2 - mean^2)`.
    pub fn standard_deviation(&self) -> Vec<f64> {
        let mean = self.mean();
        self.moment_unchecked(2, false, false)
            .iter()
            .zip(mean)
            .map(|(&m2, &m)| {
                let var = m2 - m * m;
                // Rounding can push a zero variance slightly negative.
                if var < 0.0 { 0.0 } else { var.sqrt() }
            })
            .collect()
    }

    /// Per-band entropy in bits, `-sum(p * log2(p))` over non-empty bins.
    pub fn entropy(&self) -> Vec<f64> {
        let totals = self.totals();
        self.with_bins(|bins| {
            bins.iter()
                .zip(totals)
                .map(|(band, &total)| {
                    let total = total as f64;
                    band.iter()
                        .map(|&c| c as f64 / total)
                        .filter(|&p| p != 0.0)
                        .map(|p| -p * p.log2())
                        .sum()
                })
                .collect()
        })
    }
}

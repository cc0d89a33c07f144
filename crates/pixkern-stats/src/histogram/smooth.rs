//! Moving-average and Gaussian smoothing.
//!
//! Each output bin averages an odd window centred on it, clipped at the
//! histogram edges and renormalised by the weights actually used. The
//! smoothed band is then rescaled so its total matches the original.

use std::borrow::Cow;

use pixkern_core::{Error, Result};
#[allow(unused_imports)]
use tracing::{debug, trace};

use super::Histogram;

impl Histogram {
    /// Box (`weighted == false`) or triangular moving average over `2k+1` bins.
    ///
    /// `k == 0` borrows `self` unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `k < 0`.
    pub fn smoothed(&self, weighted: bool, k: i32) -> Result<Cow<'_, Histogram>> {
        if k < 0 {
            return Err(Error::invalid_argument(format!(
                "smoothing half-width must not be negative, got {k}"
            )));
        }
        if k == 0 {
            return Ok(Cow::Borrowed(self));
        }
        debug!(weighted, k, "smoothing histogram");

        let k = k as usize;
        let out = if weighted {
            let n = 2 * k + 1;
            let denom = (n * n) as f64;
            let mut weights = vec![0.0; n];
            for i in 0..=k {
                weights[i] = (i + 1) as f64 / denom;
            }
            for i in k + 1..n {
                weights[i] = weights[n - 1 - i];
            }
            self.convolved(&weights)
        } else {
            self.box_filtered(k)
        };
        Ok(Cow::Owned(out))
    }

    /// Convolution with a sampled Gaussian of standard deviation `sigma`.
    ///
    /// The kernel has `round(2 * 2.58 * sigma)` taps, bumped to the next odd
    /// count. `sigma == 0` borrows `self` unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `sigma` is negative or NaN.
    pub fn gaussian_smoothed(&self, sigma: f64) -> Result<Cow<'_, Histogram>> {
        if !(sigma >= 0.0) {
            return Err(Error::invalid_argument(format!(
                "standard deviation must not be negative, got {sigma}"
            )));
        }
        if sigma == 0.0 {
            return Ok(Cow::Borrowed(self));
        }

        let mut num_weights = (2.0 * 2.58 * sigma + 0.5) as usize;
        if num_weights % 2 == 0 {
            num_weights += 1;
        }
        debug!(sigma, taps = num_weights, "gaussian smoothing histogram");

        let m = num_weights / 2;
        let var = sigma * sigma;
        let gain = 1.0 / (2.0 * std::f64::consts::PI * var).sqrt();
        let exp = -1.0 / (2.0 * var);
        let mut weights = vec![0.0; num_weights];
        for i in m..num_weights {
            let del = (i - m) as f64;
            let w = gain * (exp * del * del).exp();
            weights[i] = w;
            weights[num_weights - 1 - i] = w;
        }
        Ok(Cow::Owned(self.convolved(&weights)))
    }

    /// Weighted average over a symmetric odd-length kernel.
    fn convolved(&self, weights: &[f64]) -> Histogram {
        let half = weights.len() / 2;
        self.smooth_with(|counts, b| {
            let n = counts.len();
            let min = b.saturating_sub(half);
            let max = (b + half).min(n - 1);
            let offset = half.saturating_sub(b);
            let (acc, total) = counts[min..=max]
                .iter()
                .zip(&weights[offset..])
                .fold((0.0, 0.0), |(acc, total), (&c, &w)| {
                    (acc + c as f64 * w, total + w)
                });
            (acc / total + 0.5) as u32
        })
    }

    fn box_filtered(&self, k: usize) -> Histogram {
        self.smooth_with(|counts, b| {
            let n = counts.len();
            let min = b.saturating_sub(k);
            let max = (b + k).min(n - 1);
            let acc: u64 = counts[min..=max].iter().map(|&c| u64::from(c)).sum();
            (acc as f64 / (max - min + 1) as f64 + 0.5) as u32
        })
    }

    /// Builds a histogram from per-bin `filter(counts, bin)` values, then
    /// rescales each band to the original total.
    fn smooth_with(&self, filter: impl Fn(&[u32], usize) -> u32) -> Histogram {
        let totals = self.totals().to_vec();
        let out = self.empty_like();
        let source = self.bins();
        out.with_bins_mut(|bins| {
            for (band, counts) in source.iter().enumerate() {
                let smoothed = &mut bins[band];
                for (b, s) in smoothed.iter_mut().enumerate() {
                    *s = filter(counts, b);
                }
                let sum: u64 = smoothed.iter().map(|&c| u64::from(c)).sum();
                if sum == 0 {
                    continue;
                }
                let factor = totals[band] as f64 / sum as f64;
                for s in smoothed.iter_mut() {
                    *s = (*s as f64 * factor + 0.5) as u32;
                }
                trace!(band, sum, factor, "rescaled smoothed band");
            }
        });
        out
    }
}

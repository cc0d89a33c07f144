//! Threshold selection.
//!
//! Every method returns one threshold per band. Split-point scans keep
//! running per-class sums, so a band costs `O(num_bins)` except for
//! [`min_fuzziness_threshold`](Histogram::min_fuzziness_threshold), whose
//! criterion depends on every bin at every candidate.
//!
//! Levels are bin lower bounds, as in [`mean`](Histogram::mean). Scans that
//! find several equally good split points return the middle of the run.

use serde::{Deserialize, Serialize};

use pixkern_core::{Error, Result};
#[allow(unused_imports)]
use tracing::{debug, trace};

use super::Histogram;

const ISODATA_MAX_ITERATIONS: u32 = 1000;
const ISODATA_EPSILON: f64 = 1e-6;

/// Threshold selection method, as accepted by [`Histogram::threshold`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Level at which the cumulative fraction first reaches `p`.
    PTile {
        /// Target fraction in `(0, 1)`.
        p: f64,
    },
    /// Midpoint between the main peak and a distance-weighted second peak.
    Mode {
        /// Exponent applied to the distance from the main peak.
        power: f64,
    },
    /// Isodata: iterate the mean of the two class means.
    Iterative,
    /// Maximum between-class over within-class variance.
    MaxVariance,
    /// Maximum entropy partition.
    MaxEntropy,
    /// Minimum error of a two-Gaussian mixture fit.
    MinError,
    /// Minimum fuzzy-membership entropy.
    MinFuzziness,
}

impl ThresholdMethod {
    /// Short method name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PTile { .. } => "p_tile",
            Self::Mode { .. } => "mode",
            Self::Iterative => "iterative",
            Self::MaxVariance => "max_variance",
            Self::MaxEntropy => "max_entropy",
            Self::MinError => "min_error",
            Self::MinFuzziness => "min_fuzziness",
        }
    }
}

/// One band's bins and geometry.
struct Band<'a> {
    index: usize,
    counts: &'a [u32],
    total: f64,
    low: f64,
    high: f64,
    bw: f64,
    mean: f64,
}

impl Band<'_> {
    fn levels(&self) -> impl Iterator<Item = f64> + '_ {
        let bw = self.bw;
        std::iter::successors(Some(self.low), move |l| Some(l + bw)).take(self.counts.len())
    }

    /// `low + (index + run/2 + 0.5) * bw`.
    fn run_midpoint(&self, index: i64, run: u32) -> f64 {
        self.low + (index as f64 + f64::from(run) / 2.0 + 0.5) * self.bw
    }

    /// `suffix[t]` accumulates bins `t..`, with an empty entry at the end.
    fn suffix_sums(&self) -> Vec<ClassSums> {
        let levels: Vec<f64> = self.levels().collect();
        let mut suffix = vec![ClassSums::default(); self.counts.len() + 1];
        for t in (0..self.counts.len()).rev() {
            let mut s = suffix[t + 1];
            s.add(self.counts[t], levels[t] - self.mean);
            suffix[t] = s;
        }
        suffix
    }
}

/// Weighted sums of level offsets from the band mean.
#[derive(Debug, Default, Clone, Copy)]
struct ClassSums {
    n: u64,
    s1: f64,
    s2: f64,
    nonzero: usize,
}

impl ClassSums {
    #[inline]
    fn add(&mut self, c: u32, d: f64) {
        if c != 0 {
            let w = f64::from(c);
            self.n += u64::from(c);
            self.s1 += w * d;
            self.s2 += w * d * d;
            self.nonzero += 1;
        }
    }

    /// Class mean, given the offset origin.
    #[inline]
    fn mean(&self, origin: f64) -> f64 {
        origin + self.s1 / self.n as f64
    }

    /// `sum(c * (level - class_mean)^2)`, exactly zero for a single level.
    #[inline]
    fn scatter(&self) -> f64 {
        if self.nonzero <= 1 {
            return 0.0;
        }
        (self.s2 - self.s1 * self.s1 / self.n as f64).max(0.0)
    }
}

/// `x * ln(x)` with `0 * ln(0) = 0`.
#[inline]
fn x_ln_x(x: f64) -> f64 {
    if x > 0.0 { x * x.ln() } else { 0.0 }
}

impl Histogram {
    fn per_band(&self, f: impl Fn(&Band<'_>) -> f64) -> Vec<f64> {
        let totals = self.totals();
        let mean = self.mean();
        let bins = self.bins();
        (0..self.num_bands())
            .map(|band| {
                let view = Band {
                    index: band,
                    counts: &bins[band],
                    total: totals[band] as f64,
                    low: self.low[band],
                    high: self.high[band],
                    bw: self.bin_width[band],
                    mean: mean[band],
                };
                let t = f(&view);
                trace!(band, threshold = t, "band threshold");
                t
            })
            .collect()
    }

    /// Thresholds by the given method.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a p-tile fraction outside `(0, 1)`.
    pub fn threshold(&self, method: ThresholdMethod) -> Result<Vec<f64>> {
        debug!(method = method.name(), bands = self.num_bands(), "threshold");
        match method {
            ThresholdMethod::PTile { p } => self.p_tile_threshold(p),
            ThresholdMethod::Mode { power } => Ok(self.mode_threshold(power)),
            ThresholdMethod::Iterative => Ok(self.iterative_threshold()),
            ThresholdMethod::MaxVariance => Ok(self.max_variance_threshold()),
            ThresholdMethod::MaxEntropy => Ok(self.max_entropy_threshold()),
            ThresholdMethod::MinError => Ok(self.min_error_threshold()),
            ThresholdMethod::MinFuzziness => Ok(self.min_fuzziness_threshold()),
        }
    }

    /// Lower bound of the first bin at which the cumulative fraction of
    /// samples reaches `p`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] unless `0 < p < 1`.
    pub fn p_tile_threshold(&self, p: f64) -> Result<Vec<f64>> {
        if !(p > 0.0 && p < 1.0) {
            return Err(Error::invalid_argument(format!(
                "p-tile fraction must be in (0, 1), got {p}"
            )));
        }
        Ok(self.per_band(|band| {
            let last = band.counts.len() - 1;
            let mut idx = 0;
            let mut count = u64::from(band.counts[0]);
            while (count as f64 / band.total) < p && idx < last {
                idx += 1;
                count += u64::from(band.counts[idx]);
            }
            band.low + idx as f64 * band.bw
        }))
    }

    /// Bin index midway between the highest peak and the bin maximising
    /// `count * |bin - peak|^power`, rounded half up.
    ///
    /// The result is a bin index, not a level. When no second peak exists
    /// the main peak index is returned.
    pub fn mode_threshold(&self, power: f64) -> Vec<f64> {
        self.per_band(|band| {
            let mut mode1 = 0;
            for (b, &c) in band.counts.iter().enumerate() {
                if c > band.counts[mode1] {
                    mode1 = b;
                }
            }
            let mut mode2 = mode1;
            let mut best = 0.0;
            for (b, &c) in band.counts.iter().enumerate() {
                let d = f64::from(c) * (b.abs_diff(mode1) as f64).powf(power);
                if d > best {
                    mode2 = b;
                    best = d;
                }
            }
            ((mode1 + mode2) as f64 / 2.0 + 0.5).floor()
        })
    }

    /// Isodata threshold.
    ///
    /// Starts at the middle of `[low, high)` and repeatedly moves to the mean
    /// of the two class means until the estimate moves by at most `1e-6` or
    /// 1000 rounds have run. Returns the estimate that produced the last
    /// update. Empty bands return the range midpoint.
    pub fn iterative_threshold(&self) -> Vec<f64> {
        self.per_band(|band| {
            let mut threshold = 0.5 * (band.low + band.high);
            if band.total == 0.0 {
                return threshold;
            }
            let mid1 = 0.5 * (band.low + threshold);
            let mid2 = 0.5 * (threshold + band.high);

            let mut rounds = ISODATA_MAX_ITERATIONS;
            loop {
                let previous = threshold;
                let (mut sum1, mut sum2, mut count1) = (0.0, 0.0, 0u64);
                for (&c, level) in band.counts.iter().zip(band.levels()) {
                    if level <= threshold {
                        sum1 += f64::from(c) * level;
                        count1 += u64::from(c);
                    } else {
                        sum2 += f64::from(c) * level;
                    }
                }
                let count1 = count1 as f64;
                let mean1 = if count1 != 0.0 { sum1 / count1 } else { mid1 };
                let mean2 = if count1 != band.total {
                    sum2 / (band.total - count1)
                } else {
                    mid2
                };
                threshold = 0.5 * (mean1 + mean2);

                rounds -= 1;
                if (threshold - previous).abs() <= ISODATA_EPSILON || rounds == 0 {
                    return previous;
                }
            }
        })
    }

    /// Split maximising `p0 * p1 * (m0 - m1)^2 / (var0 + var1)`.
    ///
    /// Candidates where either class variance is below 0.5 are skipped. A
    /// split into two single-level classes ends the scan at their midpoint.
    pub fn max_variance_threshold(&self) -> Vec<f64> {
        self.per_band(|band| {
            let suffix = band.suffix_sums();
            let mut lower = ClassSums::default();
            let mut max_ratio = f64::MIN;
            let mut max_index: i64 = 0;
            let mut run = 0;

            for (t, (&c, level)) in band.counts.iter().zip(band.levels()).enumerate() {
                lower.add(c, level - band.mean);
                let upper = suffix[t + 1];
                if lower.n == 0 || upper.n == 0 {
                    continue;
                }
                let prob0 = lower.n as f64 / band.total;
                let prob1 = upper.n as f64 / band.total;
                let m0 = lower.mean(band.mean);
                let m1 = upper.mean(band.mean);
                let var0 = lower.scatter() / band.total;
                let var1 = upper.scatter() / band.total;

                if var0 == 0.0 && var1 == 0.0 && m1 != 0.0 {
                    max_index = (((m0 + m1) / 2.0 - band.low) / band.bw + 0.5) as i64;
                    run = 0;
                    break;
                }
                if var0 / prob0 < 0.5 || var1 / prob1 < 0.5 {
                    continue;
                }
                let mdel = m0 - m1;
                let ratio = prob0 * prob1 * mdel * mdel / (var0 + var1);
                if ratio > max_ratio {
                    max_ratio = ratio;
                    max_index = t as i64;
                    run = 0;
                } else if ratio == max_ratio {
                    run += 1;
                }
            }
            band.run_midpoint(max_index, run)
        })
    }

    /// Split maximising an entropy partition criterion.
    ///
    /// Candidates with an empty bin, or with no samples above the split,
    /// are skipped.
    pub fn max_entropy_threshold(&self) -> Vec<f64> {
        let entropy = self.entropy();
        self.per_band(|band| {
            let h = entropy[band.index];
            let n = band.counts.len();
            let mut suffix_max = vec![0u32; n + 1];
            for t in (0..n).rev() {
                suffix_max[t] = suffix_max[t + 1].max(band.counts[t]);
            }

            let mut p1 = 0.0;
            let mut h1 = 0.0;
            let mut max1 = 0u32;
            let mut max_criterion = f64::MIN;
            let mut max_index: i64 = 0;
            let mut run = 0;

            for (t, &c) in band.counts.iter().enumerate() {
                max1 = max1.max(c);
                let p = f64::from(c) / band.total;
                if p == 0.0 {
                    continue;
                }
                p1 += p;
                h1 -= p * p.log2();

                let max2 = suffix_max[t + 1];
                if max1 == 0 || max2 == 0 {
                    continue;
                }
                let ratio = h1 / h;
                let criterion = ratio * p1.ln() / (f64::from(max1) / band.total).ln()
                    + (1.0 - ratio) * (1.0 - p1).ln() / (f64::from(max2) / band.total).ln();
                if criterion > max_criterion {
                    max_criterion = criterion;
                    max_index = t as i64;
                    run = 0;
                } else if criterion == max_criterion {
                    run += 1;
                }
            }
            band.run_midpoint(max_index, run)
        })
    }

    /// Split at a local minimum of the two-Gaussian classification error
    /// `J = 1 + P1 ln s1 + P2 ln s2 - 2 (P1 ln P1 + P2 ln P2)`.
    ///
    /// A candidate counts as a local minimum only once three criterion
    /// values are known. Histograms without one return the band mean.
    pub fn min_error_threshold(&self) -> Vec<f64> {
        self.per_band(|band| {
            let suffix = band.suffix_sums();
            let mut lower = ClassSums::default();
            let mut total1: u64 = 0;
            let mut sum1 = 0.0;
            let mut sum2 = band.mean * band.total;

            let mut min_criterion = f64::MAX;
            let mut min_index: i64 = 0;
            let mut run = 0;
            let (mut j0, mut j1, mut j2) = (f64::MAX, f64::MAX, f64::MAX);
            let mut j_count = 0;

            for (t, (&c, level)) in band.counts.iter().zip(band.levels()).enumerate() {
                lower.add(c, level - band.mean);
                total1 += u64::from(c);
                let total2 = band.total as u64 - total1;
                let incr = level * f64::from(c);
                sum1 += incr;
                sum2 -= incr;

                if total1 == 0 || sum1 == 0.0 {
                    continue;
                } else if total2 == 0 || sum2 == 0.0 {
                    break;
                }

                let s1 = lower.scatter() / total1 as f64;
                if s1 < 0.5 {
                    continue;
                }
                let s2 = suffix[t + 1].scatter() / total2 as f64;
                if s2 < 0.5 {
                    continue;
                }

                let p1 = total1 as f64 / band.total;
                let p2 = total2 as f64 / band.total;
                let j = 1.0 + p1 * s1.ln() + p2 * s2.ln() - 2.0 * (x_ln_x(p1) + x_ln_x(p2));

                j_count += 1;
                j0 = j1;
                j1 = j2;
                j2 = j;
                if j_count >= 3 && j1 <= j0 && j1 <= j2 {
                    if j1 < min_criterion {
                        min_criterion = j1;
                        min_index = t as i64 - 1;
                        run = 0;
                    } else if j1 == min_criterion {
                        run += 1;
                    }
                }
            }

            if min_index == 0 {
                band.mean
            } else {
                band.run_midpoint(min_index, run)
            }
        })
    }

    /// Split minimising the entropy of fuzzy class memberships
    /// `u = 1 / (1 + |level - class_mean| / (high - low))`.
    pub fn min_fuzziness_threshold(&self) -> Vec<f64> {
        self.per_band(|band| {
            let levels: Vec<f64> = band.levels().collect();
            let range = band.high - band.low;
            let mut total1: u64 = 0;
            let mut sum1 = 0.0;
            let mut sum2 = band.mean * band.total;

            let mut min_criterion = f64::MAX;
            let mut min_index: i64 = 0;
            let mut run = 0;

            for (t, &c) in band.counts.iter().enumerate() {
                total1 += u64::from(c);
                let total2 = band.total as u64 - total1;
                let incr = levels[t] * f64::from(c);
                sum1 += incr;
                sum2 -= incr;
                if total1 == 0 || total2 == 0 {
                    continue;
                }
                let m1 = sum1 / total1 as f64;
                let m2 = sum2 / total2 as f64;

                let e: f64 = band
                    .counts
                    .iter()
                    .zip(&levels)
                    .enumerate()
                    .map(|(b, (&cb, &g))| {
                        let m = if b <= t { m1 } else { m2 };
                        let u = 1.0 / (1.0 + (g - m).abs() / range);
                        let v = 1.0 - u;
                        -(x_ln_x(u) + x_ln_x(v)) * (f64::from(cb) / band.total)
                    })
                    .sum();

                if e < min_criterion {
                    min_criterion = e;
                    min_index = t as i64;
                    run = 0;
                } else if e == min_criterion {
                    run += 1;
                }
            }
            band.run_midpoint(min_index, run)
        })
    }
}

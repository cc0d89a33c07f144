//! Pixel counting.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use pixkern_core::{dispatch_sample, Error, PixelRegion, Rect, Result, Roi, Sample};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use tracing::{debug, trace};

use super::Histogram;

/// Sampling lattice `{x_start + i*x_period, y_start + j*y_period}` for `i, j >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleGrid {
    /// First sampled column.
    pub x_start: i32,
    /// First sampled row.
    pub y_start: i32,
    /// Horizontal step (must be positive).
    pub x_period: u32,
    /// Vertical step (must be positive).
    pub y_period: u32,
}

impl Default for SampleGrid {
    /// Every pixel, starting at the origin.
    fn default() -> Self {
        Self::new(0, 0, 1, 1)
    }
}

impl SampleGrid {
    /// Creates a grid.
    pub const fn new(x_start: i32, y_start: i32, x_period: u32, y_period: u32) -> Self {
        Self {
            x_start,
            y_start,
            x_period,
            y_period,
        }
    }

    /// Every pixel, starting at the top-left corner of `bounds`.
    pub const fn every_pixel_of(bounds: &Rect) -> Self {
        Self::new(bounds.x, bounds.y, 1, 1)
    }

    /// Checks that both periods are positive.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for a zero period.
    pub fn validate(&self) -> Result<()> {
        if self.x_period == 0 || self.y_period == 0 {
            return Err(Error::invalid_argument(format!(
                "sampling periods must be positive, got {}x{}",
                self.x_period, self.y_period
            )));
        }
        Ok(())
    }
}

/// First lattice position `>= pos` for a lattice starting at `start`.
fn start_position(pos: i64, start: i64, period: i64) -> i64 {
    if pos <= start {
        return start;
    }
    let t = (pos - start) % period;
    if t == 0 { pos } else { pos + (period - t) }
}

impl Histogram {
    /// Accumulates the samples of `region` that lie on `grid` and inside `roi`.
    ///
    /// With no ROI the whole region is scanned. An ROI that does not meet the
    /// region bounds leaves the bins unchanged. Values outside `[low, high)`
    /// of a band are skipped.
    ///
    /// Counting is done into private bins and merged under the bins lock, so
    /// concurrent calls on one histogram are safe. Cached
    /// [`totals`](Histogram::totals) and [`mean`](Histogram::mean) are not
    /// refreshed.
    ///
    /// # Errors
    ///
    /// - [`Error::BandMismatch`] if the region band count differs from `num_bands()`
    /// - [`Error::InvalidArgument`] for a zero grid period
    pub fn count_pixels(
        &self,
        region: &PixelRegion,
        roi: Option<&dyn Roi>,
        grid: SampleGrid,
    ) -> Result<()> {
        if region.num_bands() != self.num_bands() {
            return Err(Error::band_mismatch(self.num_bands(), region.num_bands()));
        }
        grid.validate()?;

        let bounds = region.bounds();
        debug!(
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            bands = region.num_bands(),
            sample_type = %region.sample_type(),
            roi = roi.is_some(),
            "count_pixels"
        );

        let rects = match roi {
            None if bounds.is_empty() => Vec::new(),
            None => vec![bounds],
            Some(roi) => match roi.rectangle_list(&bounds) {
                Some(rects) => rects,
                None => {
                    debug!("ROI does not intersect region, nothing counted");
                    return Ok(());
                }
            },
        };
        if rects.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "parallel")]
        let local: Result<Vec<Vec<u32>>> = (0..self.num_bands())
            .into_par_iter()
            .map(|band| self.count_band(region, band, &rects, &grid))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let local: Result<Vec<Vec<u32>>> = (0..self.num_bands())
            .map(|band| self.count_band(region, band, &rects, &grid))
            .collect();
        let local = local?;

        self.with_bins_mut(|bins| {
            for (shared, counted) in bins.iter_mut().zip(&local) {
                for (s, &c) in shared.iter_mut().zip(counted) {
                    *s = s.saturating_add(c);
                }
            }
        });
        Ok(())
    }

    fn count_band(
        &self,
        region: &PixelRegion,
        band: usize,
        rects: &[Rect],
        grid: &SampleGrid,
    ) -> Result<Vec<u32>> {
        trace!(band, rects = rects.len(), sample_type = %region.sample_type(), "count band");
        let mut bins = vec![0u32; self.num_bins[band]];
        let range = BinRange {
            low: self.low[band],
            high: self.high[band],
            bin_width: self.bin_width[band],
        };
        dispatch_sample!(region.sample_type(), T => {
            let data = region.samples::<T>().ok_or_else(|| {
                Error::unsupported_format(region.data().type_name())
            })?;
            for rect in rects {
                count_rect(data, region, band, rect, grid, &range, &mut bins);
            }
        });
        Ok(bins)
    }
}

struct BinRange {
    low: f64,
    high: f64,
    bin_width: f64,
}

impl BinRange {
    #[inline]
    fn bin_of(&self, d: f64, num_bins: usize) -> Option<usize> {
        if d >= self.low && d < self.high {
            let i = ((d - self.low) / self.bin_width) as usize;
            Some(i.min(num_bins - 1))
        } else {
            None
        }
    }
}

fn count_rect<T: Sample>(
    data: &[T],
    region: &PixelRegion,
    band: usize,
    rect: &Rect,
    grid: &SampleGrid,
    range: &BinRange,
    bins: &mut [u32],
) {
    let origin = region.bounds();
    let x_period = i64::from(grid.x_period);
    let y_period = i64::from(grid.y_period);
    let x0 = start_position(i64::from(rect.x), i64::from(grid.x_start), x_period);
    let y0 = start_position(i64::from(rect.y), i64::from(grid.y_start), y_period);
    let n = bins.len();

    let mut y = y0;
    while y < rect.bottom() {
        let ry = (y - i64::from(origin.y)) as usize;
        let mut x = x0;
        while x < rect.right() {
            let rx = (x - i64::from(origin.x)) as usize;
            let d = data[region.index(band, rx, ry)].to_f64();
            if let Some(i) = range.bin_of(d, n) {
                bins[i] = bins[i].saturating_add(1);
            }
            x += x_period;
        }
        y += y_period;
    }
}

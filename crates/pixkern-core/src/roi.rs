//! Regions of interest.
//!
//! A [`Roi`] restricts which pixels a kernel visits. Kernels never test
//! pixels one by one; they ask for a run-length decomposition of the part
//! of the ROI that meets their region bounds:
//!
//! - `None` - the ROI does not meet the area at all (fast no-op path)
//! - `Some(vec![])` - the area meets the ROI bounds but no pixel is inside
//! - `Some(rects)` - disjoint rectangles covering exactly the inside pixels
//!
//! Three implementations are provided:
//!
//! - [`Rect`] - a single rectangle
//! - [`RoiRects`] - a union of possibly overlapping rectangles
//! - [`RoiMask`] - an image mask, inside where the sample `>= threshold`
//!
//! # Usage
//!
//! ```rust
//! use pixkern_core::{Rect, Roi, RoiRects};
//!
//! let roi = RoiRects::new(vec![Rect::new(0, 0, 4, 2), Rect::new(2, 0, 4, 2)]);
//! let runs = roi.rectangle_list(&Rect::from_size(10, 10)).unwrap();
//! assert_eq!(runs, vec![Rect::new(0, 0, 6, 2)]);
//!
//! assert!(roi.rectangle_list(&Rect::new(50, 50, 4, 4)).is_none());
//! ```

use crate::region::PixelRegion;
use crate::rect::Rect;

/// Region-of-interest abstraction consumed by pixel kernels.
pub trait Roi: Send + Sync {
    /// Bounding box of all inside pixels.
    fn bounds(&self) -> Rect;

    /// Returns `true` if pixel `(x, y)` is inside.
    fn contains(&self, x: i32, y: i32) -> bool;

    /// Disjoint rectangles covering the inside pixels within `area`.
    ///
    /// Returns `None` if `area` does not meet [`bounds`](Roi::bounds).
    fn rectangle_list(&self, area: &Rect) -> Option<Vec<Rect>>;
}

impl Roi for Rect {
    fn bounds(&self) -> Rect {
        *self
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        Rect::contains(self, x, y)
    }

    fn rectangle_list(&self, area: &Rect) -> Option<Vec<Rect>> {
        self.intersect(area).map(|r| vec![r])
    }
}

/// Union of rectangles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoiRects {
    rects: Vec<Rect>,
    bounds: Rect,
}

impl RoiRects {
    /// Creates a union ROI. Empty rectangles are dropped.
    pub fn new(rects: Vec<Rect>) -> Self {
        let rects: Vec<Rect> = rects.into_iter().filter(|r| !r.is_empty()).collect();
        let bounds = rects.iter().fold(Rect::default(), |acc, r| acc.union(r));
        Self { rects, bounds }
    }

    /// Adds a rectangle to the union.
    pub fn add(&mut self, rect: Rect) {
        if !rect.is_empty() {
            self.bounds = self.bounds.union(&rect);
            self.rects.push(rect);
        }
    }

    /// Member rectangles as supplied.
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }
}

impl Roi for RoiRects {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        self.rects.iter().any(|r| r.contains(x, y))
    }

    fn rectangle_list(&self, area: &Rect) -> Option<Vec<Rect>> {
        self.bounds.intersect(area)?;

        let clipped: Vec<Rect> = self.rects.iter().filter_map(|r| r.intersect(area)).collect();

        let mut edges: Vec<i64> = clipped
            .iter()
            .flat_map(|r| [r.y as i64, r.bottom()])
            .collect();
        edges.sort_unstable();
        edges.dedup();

        let mut bands = Vec::with_capacity(edges.len());
        for pair in edges.windows(2) {
            let (y0, y1) = (pair[0], pair[1]);
            let mut spans: Vec<(i64, i64)> = clipped
                .iter()
                .filter(|r| (r.y as i64) <= y0 && r.bottom() >= y1)
                .map(|r| (r.x as i64, r.right()))
                .collect();
            spans.sort_unstable();

            let mut runs: Vec<Rect> = Vec::new();
            let mut current: Option<(i64, i64)> = None;
            for (x0, x1) in spans {
                current = match current {
                    Some((cx0, cx1)) if x0 <= cx1 => Some((cx0, cx1.max(x1))),
                    Some(span) => {
                        runs.push(span_rect(span, y0, y1));
                        Some((x0, x1))
                    }
                    None => Some((x0, x1)),
                };
            }
            if let Some(span) = current {
                runs.push(span_rect(span, y0, y1));
            }
            bands.push(runs);
        }

        Some(merge_vertical(bands))
    }
}

fn span_rect((x0, x1): (i64, i64), y0: i64, y1: i64) -> Rect {
    Rect::new(x0 as i32, y0 as i32, (x1 - x0) as u32, (y1 - y0) as u32)
}

/// Image-backed ROI: pixels whose band-0 sample is `>= threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiMask {
    mask: PixelRegion,
    threshold: f64,
}

impl RoiMask {
    /// Creates a mask ROI over band 0 of `mask`.
    pub fn new(mask: PixelRegion, threshold: f64) -> Self {
        Self { mask, threshold }
    }

    /// Inclusion threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Backing mask region.
    pub fn mask(&self) -> &PixelRegion {
        &self.mask
    }

    fn inside_rel(&self, dx: usize, dy: usize) -> bool {
        self.mask.sample(0, dx, dy) >= self.threshold
    }
}

impl Roi for RoiMask {
    fn bounds(&self) -> Rect {
        self.mask.bounds()
    }

    fn contains(&self, x: i32, y: i32) -> bool {
        let b = self.mask.bounds();
        b.contains(x, y) && self.inside_rel((x - b.x) as usize, (y - b.y) as usize)
    }

    fn rectangle_list(&self, area: &Rect) -> Option<Vec<Rect>> {
        let b = self.mask.bounds();
        let clip = b.intersect(area)?;

        let dx0 = (clip.x - b.x) as usize;
        let dy0 = (clip.y - b.y) as usize;
        let mut bands = Vec::with_capacity(clip.height as usize);
        for row in 0..clip.height as usize {
            let y = clip.y as i64 + row as i64;
            let mut runs = Vec::new();
            let mut start: Option<usize> = None;
            for col in 0..clip.width as usize {
                let inside = self.inside_rel(dx0 + col, dy0 + row);
                match (inside, start) {
                    (true, None) => start = Some(col),
                    (false, Some(s)) => {
                        runs.push(run_rect(clip.x, s, col, y));
                        start = None;
                    }
                    _ => {}
                }
            }
            if let Some(s) = start {
                runs.push(run_rect(clip.x, s, clip.width as usize, y));
            }
            bands.push(runs);
        }

        Some(merge_vertical(bands))
    }
}

fn run_rect(x: i32, start: usize, end: usize, y: i64) -> Rect {
    Rect::new(x + start as i32, y as i32, (end - start) as u32, 1)
}

/// Joins runs of consecutive bands that share x and width.
///
/// Bands must be supplied top to bottom. Output is sorted by `(y, x)`.
fn merge_vertical(bands: Vec<Vec<Rect>>) -> Vec<Rect> {
    let mut done = Vec::new();
    let mut open: Vec<Rect> = Vec::new();

    for band in bands {
        let mut next = Vec::with_capacity(band.len());
        for run in band {
            let pos = open
                .iter()
                .position(|o| o.x == run.x && o.width == run.width && o.bottom() == run.y as i64);
            match pos {
                Some(pos) => {
                    let mut grown = open.swap_remove(pos);
                    grown.height += run.height;
                    next.push(grown);
                }
                None => next.push(run),
            }
        }
        done.append(&mut open);
        open = next;
    }
    done.extend(open);
    done.sort_by_key(|r| (r.y, r.x));
    done
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_roi() {
        let roi = Rect::new(2, 2, 4, 4);
        assert_eq!(
            roi.rectangle_list(&Rect::from_size(4, 4)),
            Some(vec![Rect::new(2, 2, 2, 2)])
        );
        assert_eq!(roi.rectangle_list(&Rect::new(10, 10, 2, 2)), None);
    }

    #[test]
    fn test_rects_disjoint_decomposition() {
        // Two overlapping squares forming an L-free staircase.
        let roi = RoiRects::new(vec![Rect::new(0, 0, 4, 4), Rect::new(2, 2, 4, 4)]);
        let runs = roi.rectangle_list(&Rect::from_size(10, 10)).unwrap();
        assert_eq!(
            runs,
            vec![
                Rect::new(0, 0, 4, 2),
                Rect::new(0, 2, 6, 2),
                Rect::new(2, 4, 4, 2),
            ]
        );
        let area: u64 = runs.iter().map(|r| r.area()).sum();
        assert_eq!(area, 16 + 16 - 4);
    }

    #[test]
    fn test_rects_gap_inside_bounds() {
        let roi = RoiRects::new(vec![Rect::new(0, 0, 2, 2), Rect::new(8, 8, 2, 2)]);
        // Meets the bounding box but neither member.
        assert_eq!(roi.rectangle_list(&Rect::new(4, 4, 2, 2)), Some(vec![]));
        assert!(roi.contains(9, 9));
        assert!(!roi.contains(5, 5));
    }

    #[test]
    fn test_mask_runs_merge_vertically() {
        #[rustfmt::skip]
        let data = vec![
            0u8, 1, 1, 0,
            0, 1, 1, 0,
            1, 0, 0, 1,
        ];
        let mask = PixelRegion::interleaved(Rect::from_size(4, 3), 1, data).unwrap();
        let roi = RoiMask::new(mask, 1.0);
        let runs = roi.rectangle_list(&Rect::from_size(4, 3)).unwrap();
        assert_eq!(
            runs,
            vec![
                Rect::new(1, 0, 2, 2),
                Rect::new(0, 2, 1, 1),
                Rect::new(3, 2, 1, 1),
            ]
        );
        assert!(roi.contains(1, 1));
        assert!(!roi.contains(0, 0));
    }

    #[test]
    fn test_mask_empty_and_miss() {
        let mask = PixelRegion::interleaved(Rect::new(10, 10, 2, 2), 1, vec![0u8; 4]).unwrap();
        let roi = RoiMask::new(mask, 1.0);
        assert_eq!(roi.rectangle_list(&Rect::new(10, 10, 2, 2)), Some(vec![]));
        assert_eq!(roi.rectangle_list(&Rect::from_size(5, 5)), None);
    }
}

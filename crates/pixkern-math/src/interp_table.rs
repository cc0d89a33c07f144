//! Separable polyphase interpolation tables.
//!
//! # Overview
//!
//! An [`InterpolationTable`] holds one set of tap weights per sub-pixel
//! phase, for the horizontal and the vertical direction. Each kernel set is
//! kept in three numeric representations:
//!
//! - fixed point `i32`, scaled by `2^precision_bits`
//! - `f32`
//! - `f64`
//!
//! Whichever representation is supplied at construction is stored as is,
//! the other two are derived from it. If no vertical kernel is given, the
//! vertical tables share the horizontal storage and `height == width`.
//!
//! ```text
//! phase p, tap i  ->  data[p * width + i]
//!
//!          left_padding      right_padding
//!          <---------->      <----------->
//!   taps:  [ s_  s0 | key | s1  s2 ]
//! ```
//!
//! # Evaluation
//!
//! Evaluation is generic over [`TapSample`]:
//!
//! | sample | sub-pixel position | accumulator | result |
//! |--------|--------------------|-------------|--------|
//! | `i32`  | phase index        | `i64`       | `(sum + round) >> precision_bits` |
//! | `f32`  | fraction in [0, 1) | `f32`       | sum |
//! | `f64`  | fraction in [0, 1) | `f64`       | sum |
//!
//! 2D fixed-point interpolation rounds each row sum before the vertical
//! pass. That two-stage rounding is part of the result contract and differs
//! in the last bit from a single combined accumulation.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_math::InterpolationTable;
//!
//! // 2-tap linear kernel, 8 phases, 8 fractional bits.
//! let table = InterpolationTable::bilinear(3, 8).unwrap();
//!
//! // Phase 4 of 8 is the midpoint.
//! assert_eq!(table.interpolate_h(&[100i32, 200], 4), 150);
//! assert_eq!(table.interpolate_h(&[100.0f32, 200.0], 0.5), 150.0);
//! ```

use std::sync::Arc;

use pixkern_core::{Error, Result};

#[allow(unused_imports)]
use tracing::{debug, trace};

/// Geometry and precision of an interpolation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    /// Index of the key tap in the horizontal kernel
    pub key_x: usize,
    /// Index of the key tap in the vertical kernel
    pub key_y: usize,
    /// Horizontal tap count
    pub width: usize,
    /// Vertical tap count (ignored when the vertical kernel is omitted)
    pub height: usize,
    /// log2 of the horizontal phase count
    pub subsample_bits_h: u32,
    /// log2 of the vertical phase count (ignored when the vertical kernel is omitted)
    pub subsample_bits_v: u32,
    /// Fractional bits of the fixed-point representation
    pub precision_bits: u32,
}

/// Kernel weights in the representation supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum KernelData {
    /// Fixed point, scaled by `2^precision_bits`
    Int(Vec<i32>),
    /// Single precision
    Float(Vec<f32>),
    /// Double precision
    Double(Vec<f64>),
}

impl KernelData {
    fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }
}

/// One kernel set in all three representations.
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct Kernels {
    int: Arc<[i32]>,
    float: Arc<[f32]>,
    double: Arc<[f64]>,
}

impl Kernels {
    fn derive(data: KernelData, precision_bits: u32) -> Self {
        match data {
            KernelData::Int(int) => {
                let prec = (1u64 << precision_bits) as f64;
                let double: Vec<f64> = int.iter().map(|&i| i as f64 / prec).collect();
                let float: Vec<f32> = double.iter().map(|&d| d as f32).collect();
                Self {
                    int: int.into(),
                    float: float.into(),
                    double: double.into(),
                }
            }
            KernelData::Float(float) => {
                let prec = (1u64 << precision_bits) as f32;
                let int: Vec<i32> = float.iter().map(|&f| (f * prec + 0.5).floor() as i32).collect();
                let double: Vec<f64> = float.iter().map(|&f| f as f64).collect();
                Self {
                    int: int.into(),
                    float: float.into(),
                    double: double.into(),
                }
            }
            KernelData::Double(double) => {
                let prec = (1u64 << precision_bits) as f64;
                let int: Vec<i32> = double.iter().map(|&d| (d * prec + 0.5).floor() as i32).collect();
                let float: Vec<f32> = double.iter().map(|&d| d as f32).collect();
                Self {
                    int: int.into(),
                    float: float.into(),
                    double: double.into(),
                }
            }
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Sample type an [`InterpolationTable`] can evaluate.
///
/// Implemented for `i32` (fixed point), `f32` and `f64`.
pub trait TapSample: Copy + sealed::Sealed {
    /// Sub-pixel position: a phase index for `i32`, a fraction for floats.
    type Frac: Copy;
    /// Kernel weight type used for this sample type.
    type Weight: Copy;
    /// Accumulator type.
    type Acc: Copy;

    #[doc(hidden)]
    fn weights(k: &Kernels) -> &[Self::Weight];
    #[doc(hidden)]
    fn phase(frac: Self::Frac, num_subsamples: usize) -> usize;
    #[doc(hidden)]
    fn zero() -> Self::Acc;
    #[doc(hidden)]
    fn mac(acc: Self::Acc, w: Self::Weight, s: Self) -> Self::Acc;
    #[doc(hidden)]
    fn finish(acc: Self::Acc, precision_bits: u32) -> Self;
}

#[inline]
fn float_phase(frac: f32, n: usize) -> usize {
    ((frac * n as f32) as usize).min(n - 1)
}

impl TapSample for i32 {
    type Frac = usize;
    type Weight = i32;
    type Acc = i64;

    #[inline]
    fn weights(k: &Kernels) -> &[i32] {
        &k.int
    }
    #[inline]
    fn phase(frac: usize, _n: usize) -> usize {
        frac
    }
    #[inline]
    fn zero() -> i64 {
        0
    }
    #[inline]
    fn mac(acc: i64, w: i32, s: i32) -> i64 {
        acc + w as i64 * s as i64
    }
    #[inline]
    fn finish(acc: i64, precision_bits: u32) -> i32 {
        let round = if precision_bits > 0 {
            1i64 << (precision_bits - 1)
        } else {
            0
        };
        ((acc + round) >> precision_bits) as i32
    }
}

impl TapSample for f32 {
    type Frac = f32;
    type Weight = f32;
    type Acc = f32;

    #[inline]
    fn weights(k: &Kernels) -> &[f32] {
        &k.float
    }
    #[inline]
    fn phase(frac: f32, n: usize) -> usize {
        float_phase(frac, n)
    }
    #[inline]
    fn zero() -> f32 {
        0.0
    }
    #[inline]
    fn mac(acc: f32, w: f32, s: f32) -> f32 {
        acc + w * s
    }
    #[inline]
    fn finish(acc: f32, _precision_bits: u32) -> f32 {
        acc
    }
}

impl TapSample for f64 {
    type Frac = f32;
    type Weight = f64;
    type Acc = f64;

    #[inline]
    fn weights(k: &Kernels) -> &[f64] {
        &k.double
    }
    #[inline]
    fn phase(frac: f32, n: usize) -> usize {
        float_phase(frac, n)
    }
    #[inline]
    fn zero() -> f64 {
        0.0
    }
    #[inline]
    fn mac(acc: f64, w: f64, s: f64) -> f64 {
        acc + w * s
    }
    #[inline]
    fn finish(acc: f64, _precision_bits: u32) -> f64 {
        acc
    }
}

/// Precomputed separable polyphase resampling kernel.
///
/// Cheap to clone: kernel storage is shared.
#[derive(Debug, Clone)]
pub struct InterpolationTable {
    width: usize,
    height: usize,
    left_padding: usize,
    right_padding: usize,
    top_padding: usize,
    bottom_padding: usize,
    subsample_bits_h: u32,
    subsample_bits_v: u32,
    precision_bits: u32,
    h: Kernels,
    v: Kernels,
}

impl InterpolationTable {
    /// Largest supported fixed-point precision.
    pub const MAX_PRECISION_BITS: u32 = 30;

    /// Largest supported log2 phase count.
    pub const MAX_SUBSAMPLE_BITS: u32 = 16;

    /// Builds a table from horizontal and optional vertical kernel data.
    ///
    /// `data_h` must hold exactly `width << subsample_bits_h` weights, and
    /// `data_v` (if present) `height << subsample_bits_v`. When `data_v` is
    /// `None` the vertical kernel aliases the horizontal one.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] on a length mismatch, a zero tap count, a
    /// key tap outside its kernel, or precision/subsample bits beyond
    /// [`MAX_PRECISION_BITS`](Self::MAX_PRECISION_BITS) /
    /// [`MAX_SUBSAMPLE_BITS`](Self::MAX_SUBSAMPLE_BITS).
    pub fn new(layout: TableLayout, data_h: KernelData, data_v: Option<KernelData>) -> Result<Self> {
        let TableLayout {
            key_x,
            key_y,
            width,
            subsample_bits_h,
            precision_bits,
            ..
        } = layout;

        if precision_bits > Self::MAX_PRECISION_BITS {
            return Err(Error::invalid_argument(format!(
                "precision bits {precision_bits} exceed {}",
                Self::MAX_PRECISION_BITS
            )));
        }
        check_kernel("horizontal", key_x, width, subsample_bits_h, data_h.len())?;

        let (height, subsample_bits_v) = if data_v.is_some() {
            (layout.height, layout.subsample_bits_v)
        } else {
            (width, subsample_bits_h)
        };
        if let Some(ref dv) = data_v {
            check_kernel("vertical", key_y, height, subsample_bits_v, dv.len())?;
        } else if key_y >= height {
            return Err(Error::invalid_argument(format!(
                "vertical key tap {key_y} outside kernel of {height} taps"
            )));
        }

        let h = Kernels::derive(data_h, precision_bits);
        let v = match data_v {
            Some(dv) => Kernels::derive(dv, precision_bits),
            None => h.clone(),
        };

        debug!(
            width,
            height,
            subsample_bits_h,
            subsample_bits_v,
            precision_bits,
            "built interpolation table"
        );

        Ok(Self {
            width,
            height,
            left_padding: key_x,
            right_padding: width - key_x - 1,
            top_padding: key_y,
            bottom_padding: height - key_y - 1,
            subsample_bits_h,
            subsample_bits_v,
            precision_bits,
            h,
            v,
        })
    }

    /// Builds a table whose vertical kernel is the horizontal one.
    pub fn symmetric(
        key: usize,
        width: usize,
        subsample_bits: u32,
        precision_bits: u32,
        data: KernelData,
    ) -> Result<Self> {
        let layout = TableLayout {
            key_x: key,
            key_y: key,
            width,
            height: width,
            subsample_bits_h: subsample_bits,
            subsample_bits_v: subsample_bits,
            precision_bits,
        };
        Self::new(layout, data, None)
    }

    /// Single-tap identity kernel.
    pub fn nearest(precision_bits: u32) -> Result<Self> {
        if precision_bits > Self::MAX_PRECISION_BITS {
            return Err(Error::invalid_argument("precision bits out of range"));
        }
        Self::symmetric(0, 1, 0, precision_bits, KernelData::Int(vec![1 << precision_bits]))
    }

    /// 2-tap linear kernel with `2^subsample_bits` phases.
    pub fn bilinear(subsample_bits: u32, precision_bits: u32) -> Result<Self> {
        check_subsample_bits(subsample_bits)?;
        let n = 1usize << subsample_bits;
        let data = (0..n)
            .flat_map(|p| {
                let t = p as f64 / n as f64;
                [1.0 - t, t]
            })
            .collect();
        Self::symmetric(0, 2, subsample_bits, precision_bits, KernelData::Double(data))
    }

    /// 4-tap cubic convolution kernel with parameter `a` (`-0.5` is the
    /// usual choice), key tap 1.
    pub fn bicubic(subsample_bits: u32, precision_bits: u32, a: f64) -> Result<Self> {
        check_subsample_bits(subsample_bits)?;
        let n = 1usize << subsample_bits;
        let data = (0..n)
            .flat_map(|p| {
                let t = p as f64 / n as f64;
                [
                    cubic_weight(1.0 + t, a),
                    cubic_weight(t, a),
                    cubic_weight(1.0 - t, a),
                    cubic_weight(2.0 - t, a),
                ]
            })
            .collect();
        Self::symmetric(1, 4, subsample_bits, precision_bits, KernelData::Double(data))
    }

    /// Horizontal tap count.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Vertical tap count.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Taps left of the key tap.
    #[inline]
    pub fn left_padding(&self) -> usize {
        self.left_padding
    }

    /// Taps right of the key tap.
    #[inline]
    pub fn right_padding(&self) -> usize {
        self.right_padding
    }

    /// Taps above the key tap.
    #[inline]
    pub fn top_padding(&self) -> usize {
        self.top_padding
    }

    /// Taps below the key tap.
    #[inline]
    pub fn bottom_padding(&self) -> usize {
        self.bottom_padding
    }

    /// log2 of the horizontal phase count.
    #[inline]
    pub fn subsample_bits_h(&self) -> u32 {
        self.subsample_bits_h
    }

    /// log2 of the vertical phase count.
    #[inline]
    pub fn subsample_bits_v(&self) -> u32 {
        self.subsample_bits_v
    }

    /// Horizontal phase count.
    #[inline]
    pub fn num_subsamples_h(&self) -> usize {
        1 << self.subsample_bits_h
    }

    /// Vertical phase count.
    #[inline]
    pub fn num_subsamples_v(&self) -> usize {
        1 << self.subsample_bits_v
    }

    /// Fractional bits of the fixed-point kernels.
    #[inline]
    pub fn precision_bits(&self) -> u32 {
        self.precision_bits
    }

    /// Tables are always separable.
    #[inline]
    pub fn is_separable(&self) -> bool {
        true
    }

    /// Horizontal fixed-point kernel.
    pub fn horizontal_table_int(&self) -> &[i32] {
        &self.h.int
    }

    /// Horizontal `f32` kernel.
    pub fn horizontal_table_float(&self) -> &[f32] {
        &self.h.float
    }

    /// Horizontal `f64` kernel.
    pub fn horizontal_table_double(&self) -> &[f64] {
        &self.h.double
    }

    /// Vertical fixed-point kernel.
    pub fn vertical_table_int(&self) -> &[i32] {
        &self.v.int
    }

    /// Vertical `f32` kernel.
    pub fn vertical_table_float(&self) -> &[f32] {
        &self.v.float
    }

    /// Vertical `f64` kernel.
    pub fn vertical_table_double(&self) -> &[f64] {
        &self.v.double
    }

    /// Returns `true` if the vertical kernel shares the horizontal storage.
    pub fn is_vertical_aliased(&self) -> bool {
        Arc::ptr_eq(&self.h.int, &self.v.int)
    }

    /// Interpolates a row of `width` samples.
    ///
    /// # Panics
    ///
    /// Panics if `samples` holds fewer than `width` values or a fixed-point
    /// phase is not below [`num_subsamples_h`](Self::num_subsamples_h).
    pub fn interpolate_h<T: TapSample>(&self, samples: &[T], xfrac: T::Frac) -> T {
        let p = T::phase(xfrac, self.num_subsamples_h());
        let w = &T::weights(&self.h)[p * self.width..(p + 1) * self.width];
        T::finish(dot::<T>(w, &samples[..self.width]), self.precision_bits)
    }

    /// Interpolates a column of `height` samples.
    ///
    /// # Panics
    ///
    /// As [`interpolate_h`](Self::interpolate_h), with `height` taps.
    pub fn interpolate_v<T: TapSample>(&self, samples: &[T], yfrac: T::Frac) -> T {
        let p = T::phase(yfrac, self.num_subsamples_v());
        let w = &T::weights(&self.v)[p * self.height..(p + 1) * self.height];
        T::finish(dot::<T>(w, &samples[..self.height]), self.precision_bits)
    }

    /// 2-tap horizontal interpolation. Assumes `width == 2`.
    #[inline]
    pub fn interpolate_h2<T: TapSample>(&self, s0: T, s1: T, xfrac: T::Frac) -> T {
        let p = T::phase(xfrac, self.num_subsamples_h());
        let w = &T::weights(&self.h)[2 * p..2 * p + 2];
        T::finish(dot::<T>(w, &[s0, s1]), self.precision_bits)
    }

    /// 4-tap horizontal interpolation. Assumes `width == 4`.
    #[inline]
    pub fn interpolate_h4<T: TapSample>(&self, s_: T, s0: T, s1: T, s2: T, xfrac: T::Frac) -> T {
        let p = T::phase(xfrac, self.num_subsamples_h());
        let w = &T::weights(&self.h)[4 * p..4 * p + 4];
        T::finish(dot::<T>(w, &[s_, s0, s1, s2]), self.precision_bits)
    }

    /// 2-tap vertical interpolation. Assumes `height == 2`.
    #[inline]
    pub fn interpolate_v2<T: TapSample>(&self, s0: T, s1: T, yfrac: T::Frac) -> T {
        let p = T::phase(yfrac, self.num_subsamples_v());
        let w = &T::weights(&self.v)[2 * p..2 * p + 2];
        T::finish(dot::<T>(w, &[s0, s1]), self.precision_bits)
    }

    /// 4-tap vertical interpolation. Assumes `height == 4`.
    #[inline]
    pub fn interpolate_v4<T: TapSample>(&self, s_: T, s0: T, s1: T, s2: T, yfrac: T::Frac) -> T {
        let p = T::phase(yfrac, self.num_subsamples_v());
        let w = &T::weights(&self.v)[4 * p..4 * p + 4];
        T::finish(dot::<T>(w, &[s_, s0, s1, s2]), self.precision_bits)
    }

    /// 2x2 interpolation: `s[row][col]`. Assumes a 2x2 kernel.
    pub fn interpolate_2x2<T: TapSample>(&self, s: [[T; 2]; 2], xfrac: T::Frac, yfrac: T::Frac) -> T {
        let r0 = self.interpolate_h2(s[0][0], s[0][1], xfrac);
        let r1 = self.interpolate_h2(s[1][0], s[1][1], xfrac);
        self.interpolate_v2(r0, r1, yfrac)
    }

    /// 4x4 interpolation: `s[row][col]`, rows from one above the key row.
    /// Assumes a 4x4 kernel.
    pub fn interpolate_4x4<T: TapSample>(&self, s: [[T; 4]; 4], xfrac: T::Frac, yfrac: T::Frac) -> T {
        let rows = s.map(|r| self.interpolate_h4(r[0], r[1], r[2], r[3], xfrac));
        self.interpolate_v4(rows[0], rows[1], rows[2], rows[3], yfrac)
    }

    /// General 2D interpolation over `height` rows of `width` samples.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `height` rows or `width` samples per row are given.
    pub fn interpolate<T: TapSample>(&self, rows: &[&[T]], xfrac: T::Frac, yfrac: T::Frac) -> T {
        let column: Vec<T> = rows[..self.height]
            .iter()
            .map(|row| self.interpolate_h(row, xfrac))
            .collect();
        self.interpolate_v(&column, yfrac)
    }

    /// 4x4 fixed-point samples evaluated with the `f32` kernels, truncated
    /// to an integer at the end. No intermediate rounding.
    pub fn interpolate_4x4_float(&self, s: [[i32; 4]; 4], xfrac: usize, yfrac: usize) -> i32 {
        let wh = &self.h.float[4 * xfrac..4 * xfrac + 4];
        let wv = &self.v.float[4 * yfrac..4 * yfrac + 4];
        let rows = s.map(|r| {
            let mut sum = wh[0] * r[0] as f32;
            sum += wh[1] * r[1] as f32;
            sum += wh[2] * r[2] as f32;
            sum += wh[3] * r[3] as f32;
            sum
        });
        let mut sum = wv[0] * rows[0];
        sum += wv[1] * rows[1];
        sum += wv[2] * rows[2];
        sum += wv[3] * rows[3];
        sum as i32
    }
}

#[inline]
fn dot<T: TapSample>(weights: &[T::Weight], samples: &[T]) -> T::Acc {
    weights
        .iter()
        .zip(samples)
        .fold(T::zero(), |acc, (&w, &s)| T::mac(acc, w, s))
}

fn check_kernel(dir: &str, key: usize, taps: usize, subsample_bits: u32, len: usize) -> Result<()> {
    if taps == 0 {
        return Err(Error::invalid_argument(format!("{dir} kernel has no taps")));
    }
    if key >= taps {
        return Err(Error::invalid_argument(format!(
            "{dir} key tap {key} outside kernel of {taps} taps"
        )));
    }
    check_subsample_bits(subsample_bits)?;
    let expected = taps << subsample_bits;
    if len != expected {
        return Err(Error::invalid_argument(format!(
            "{dir} kernel data has {len} entries, expected {expected}"
        )));
    }
    Ok(())
}

fn check_subsample_bits(bits: u32) -> Result<()> {
    if bits > InterpolationTable::MAX_SUBSAMPLE_BITS {
        return Err(Error::invalid_argument(format!(
            "subsample bits {bits} exceed {}",
            InterpolationTable::MAX_SUBSAMPLE_BITS
        )));
    }
    Ok(())
}

/// Keys cubic convolution weight at distance `x`.
fn cubic_weight(x: f64, a: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        ((a + 2.0) * x - (a + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((a * x - 5.0 * a) * x + 8.0 * a) * x - 4.0 * a
    } else {
        0.0
    }
}

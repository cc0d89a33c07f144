//! 2D projective transforms.
//!
//! # Overview
//!
//! [`PerspectiveTransform`] is a 3x3 homogeneous matrix mapping
//!
//! ```text
//! x' = (m00*x + m01*y + m02) / w
//! y' = (m10*x + m11*y + m12) / w
//! w  =  m20*x + m21*y + m22
//! ```
//!
//! Resampling operators use it to map destination pixel centres back into
//! source space. Besides the usual setters it can be solved from four point
//! correspondences ([`square_to_quad`](PerspectiveTransform::square_to_quad),
//! [`quad_to_square`](PerspectiveTransform::quad_to_square),
//! [`quad_to_quad`](PerspectiveTransform::quad_to_quad)).
//!
//! # Composition order
//!
//! Matrices act on column vectors.
//!
//! - `a.concatenate(&b)` sets `a = b * a`: `a` runs first, then `b`
//! - `a.pre_concatenate(&b)` sets `a = a * b`: `b` runs first, then `a`
//!
//! Every mutator reads all inputs before writing any output, so composing a
//! transform with a copy of itself is safe.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_math::PerspectiveTransform;
//!
//! let quad = [[10.0, 10.0], [110.0, 20.0], [100.0, 120.0], [0.0, 100.0]];
//! let tx = PerspectiveTransform::square_to_quad(quad);
//!
//! assert_eq!(tx.transform_point([0.0, 0.0]), [10.0, 10.0]);
//!
//! let inv = tx.create_inverse().unwrap();
//! let p = inv.transform_point([110.0, 20.0]);
//! assert!((p[0] - 1.0).abs() < 1e-9 && p[1].abs() < 1e-9);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - `DMat3` interop
//!
//! # Used By
//!
//! - Warp and resample operators (outside this workspace)

use std::fmt;

use glam::{DMat3, DVec3};
use pixkern_core::{Error, Result};

#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::affine::AffineTransform;

/// Magnitude below which a homogeneous divisor counts as zero.
pub const PERSPECTIVE_DIVIDE_EPSILON: f64 = 1.0e-10;

type Matrix = [[f64; 3]; 3];

/// A coordinate scalar accepted by the array transforms.
pub trait Coord: Copy {
    /// Widens to `f64`.
    fn to_f64(self) -> f64;
    /// Narrows from `f64`.
    fn from_f64(v: f64) -> Self;
}

impl Coord for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl Coord for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

/// 3x3 homogeneous 2D transform, stored row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerspectiveTransform {
    m: Matrix,
}

impl Default for PerspectiveTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<AffineTransform> for PerspectiveTransform {
    fn from(tx: AffineTransform) -> Self {
        Self { m: affine_matrix(&tx) }
    }
}

impl From<DMat3> for PerspectiveTransform {
    fn from(mat: DMat3) -> Self {
        Self::from_dmat3(mat)
    }
}

impl PerspectiveTransform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    /// Creates a transform from row arrays.
    #[inline]
    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Self { m: rows }
    }

    /// Creates a transform from a row-major flat array
    /// `[m00, m01, m02, m10, m11, m12, m20, m21, m22]`.
    pub const fn from_flat(f: [f64; 9]) -> Self {
        Self {
            m: [[f[0], f[1], f[2]], [f[3], f[4], f[5]], [f[6], f[7], f[8]]],
        }
    }

    /// Creates a transform from single-precision rows.
    pub fn from_rows_f32(rows: [[f32; 3]; 3]) -> Self {
        Self {
            m: rows.map(|r| r.map(f64::from)),
        }
    }

    /// Converts from a glam column-major matrix.
    pub fn from_dmat3(mat: DMat3) -> Self {
        let c = mat.to_cols_array_2d();
        Self {
            m: [
                [c[0][0], c[1][0], c[2][0]],
                [c[0][1], c[1][1], c[2][1]],
                [c[0][2], c[1][2], c[2][2]],
            ],
        }
    }

    /// Converts to a glam column-major matrix.
    pub fn to_dmat3(&self) -> DMat3 {
        let m = &self.m;
        DMat3::from_cols(
            DVec3::new(m[0][0], m[1][0], m[2][0]),
            DVec3::new(m[0][1], m[1][1], m[2][1]),
            DVec3::new(m[0][2], m[1][2], m[2][2]),
        )
    }

    /// Maps the unit square `(0,0), (1,0), (1,1), (0,1)` onto `quad`,
    /// corner for corner.
    ///
    /// A parallelogram (`x0 - x1 + x2 - x3 == 0` and likewise in y) yields
    /// an affine solution with `m20 == m21 == 0`.
    pub fn square_to_quad(quad: [[f64; 2]; 4]) -> Self {
        let [[x0, y0], [x1, y1], [x2, y2], [x3, y3]] = quad;
        let dx3 = x0 - x1 + x2 - x3;
        let dy3 = y0 - y1 + y2 - y3;

        let m = if dx3 == 0.0 && dy3 == 0.0 {
            trace!("square_to_quad: affine case");
            [
                [x1 - x0, x2 - x1, x0],
                [y1 - y0, y2 - y1, y0],
                [0.0, 0.0, 1.0],
            ]
        } else {
            let dx1 = x1 - x2;
            let dy1 = y1 - y2;
            let dx2 = x3 - x2;
            let dy2 = y3 - y2;

            let invdet = 1.0 / (dx1 * dy2 - dx2 * dy1);
            let m20 = (dx3 * dy2 - dx2 * dy3) * invdet;
            let m21 = (dx1 * dy3 - dx3 * dy1) * invdet;
            [
                [x1 - x0 + m20 * x1, x3 - x0 + m21 * x3, x0],
                [y1 - y0 + m20 * y1, y3 - y0 + m21 * y3, y0],
                [m20, m21, 1.0],
            ]
        };
        Self { m }
    }

    /// Maps `quad` onto the unit square.
    ///
    /// The result is the adjoint of [`square_to_quad`](Self::square_to_quad)
    /// and is not normalized, which is harmless for homogeneous mapping.
    pub fn quad_to_square(quad: [[f64; 2]; 4]) -> Self {
        let mut tx = Self::square_to_quad(quad);
        tx.make_adjoint();
        tx
    }

    /// Maps quadrilateral `src` onto `dst`, corner for corner.
    ///
    /// ```rust
    /// use pixkern_math::PerspectiveTransform;
    ///
    /// let unit = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    /// assert!(PerspectiveTransform::quad_to_quad(unit, unit).is_identity());
    /// ```
    pub fn quad_to_quad(src: [[f64; 2]; 4], dst: [[f64; 2]; 4]) -> Self {
        let mut tx = Self::quad_to_square(src);
        tx.concatenate(&Self::square_to_quad(dst));
        tx
    }

    /// Single-precision variant of [`quad_to_quad`](Self::quad_to_quad).
    pub fn quad_to_quad_f32(src: [[f32; 2]; 4], dst: [[f32; 2]; 4]) -> Self {
        let widen = |q: [[f32; 2]; 4]| q.map(|p| p.map(f64::from));
        Self::quad_to_quad(widen(src), widen(dst))
    }

    /// Determinant of the full 3x3 matrix.
    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        (m[0][0] * ((m[1][1] * m[2][2]) - (m[1][2] * m[2][1])))
            - (m[0][1] * ((m[1][0] * m[2][2]) - (m[1][2] * m[2][0])))
            + (m[0][2] * ((m[1][0] * m[2][1]) - (m[1][1] * m[2][0])))
    }

    /// Matrix rows.
    #[inline]
    pub fn matrix(&self) -> [[f64; 3]; 3] {
        self.m
    }

    /// Row-major flat matrix.
    pub fn flat_matrix(&self) -> [f64; 9] {
        let m = &self.m;
        [
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        ]
    }

    /// Follows this transform with a translation.
    pub fn translate(&mut self, tx: f64, ty: f64) {
        let mut t = Self::IDENTITY;
        t.set_to_translation(tx, ty);
        self.concatenate(&t);
    }

    /// Follows this transform with a rotation about the origin.
    pub fn rotate(&mut self, theta: f64) {
        let mut t = Self::IDENTITY;
        t.set_to_rotation(theta);
        self.concatenate(&t);
    }

    /// Follows this transform with a rotation about `(x, y)`.
    pub fn rotate_about(&mut self, theta: f64, x: f64, y: f64) {
        let mut t = Self::IDENTITY;
        t.set_to_rotation_about(theta, x, y);
        self.concatenate(&t);
    }

    /// Follows this transform with a scale.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        let mut t = Self::IDENTITY;
        t.set_to_scale(sx, sy);
        self.concatenate(&t);
    }

    /// Follows this transform with a shear.
    pub fn shear(&mut self, shx: f64, shy: f64) {
        let mut t = Self::IDENTITY;
        t.set_to_shear(shx, shy);
        self.concatenate(&t);
    }

    /// Resets to the identity.
    pub fn set_to_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    /// Resets to a translation.
    pub fn set_to_translation(&mut self, tx: f64, ty: f64) {
        self.m = [[1.0, 0.0, tx], [0.0, 1.0, ty], [0.0, 0.0, 1.0]];
    }

    /// Resets to a rotation about the origin.
    pub fn set_to_rotation(&mut self, theta: f64) {
        let cos = theta.cos();
        let sin = theta.sin();
        self.m = [[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]];
    }

    /// Resets to a rotation about `(x, y)`.
    pub fn set_to_rotation_about(&mut self, theta: f64, x: f64, y: f64) {
        self.set_to_rotation(theta);
        let sin = self.m[1][0];
        let one_minus_cos = 1.0 - self.m[0][0];
        self.m[0][2] = x * one_minus_cos + y * sin;
        self.m[1][2] = y * one_minus_cos - x * sin;
    }

    /// Resets to a scale.
    pub fn set_to_scale(&mut self, sx: f64, sy: f64) {
        self.m = [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]];
    }

    /// Resets to a shear.
    pub fn set_to_shear(&mut self, shx: f64, shy: f64) {
        self.m = [[1.0, shx, 0.0], [shy, 1.0, 0.0], [0.0, 0.0, 1.0]];
    }

    /// Copies another transform.
    pub fn set_transform(&mut self, tx: &PerspectiveTransform) {
        self.m = tx.m;
    }

    /// Resets to an affine transform.
    pub fn set_affine(&mut self, tx: &AffineTransform) {
        self.m = affine_matrix(tx);
    }

    /// Replaces the matrix rows.
    pub fn set_matrix(&mut self, rows: [[f64; 3]; 3]) {
        self.m = rows;
    }

    /// `self = tx * self`: runs `self` first, then `tx`.
    pub fn concatenate(&mut self, tx: &PerspectiveTransform) {
        self.m = multiply(&tx.m, &self.m);
    }

    /// `self = tx * self` with `tx` affine.
    pub fn concatenate_affine(&mut self, tx: &AffineTransform) {
        self.m = multiply(&affine_matrix(tx), &self.m);
    }

    /// `self = self * tx`: runs `tx` first, then `self`.
    pub fn pre_concatenate(&mut self, tx: &PerspectiveTransform) {
        self.m = multiply(&self.m, &tx.m);
    }

    /// `self = self * tx` with `tx` affine.
    pub fn pre_concatenate_affine(&mut self, tx: &AffineTransform) {
        self.m = multiply(&self.m, &affine_matrix(tx));
    }

    /// Returns the adjoint (transposed cofactor matrix).
    ///
    /// The adjoint is a scalar multiple of the inverse and maps points the
    /// same way in homogeneous coordinates.
    pub fn create_adjoint(&self) -> Self {
        let mut tx = *self;
        tx.make_adjoint();
        tx
    }

    /// Returns the inverse, normalized so `m22 == 1`.
    ///
    /// # Errors
    ///
    /// [`Error::NonInvertible`] if the adjoint's `m22` is below
    /// [`PERSPECTIVE_DIVIDE_EPSILON`] in magnitude.
    pub fn create_inverse(&self) -> Result<Self> {
        let mut tx = self.create_adjoint();
        if tx.m[2][2].abs() < PERSPECTIVE_DIVIDE_EPSILON {
            debug!(m22 = tx.m[2][2], "perspective transform is not invertible");
            return Err(Error::non_invertible(
                "adjoint m22 vanishes; transform cannot be normalized",
            ));
        }
        tx.normalize();
        Ok(tx)
    }

    /// Maps one point.
    ///
    /// No guard on `w == 0`: the result is infinite or NaN in that case.
    #[inline]
    pub fn transform_point(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        let m = &self.m;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        [
            (m[0][0] * x + m[0][1] * y + m[0][2]) / w,
            (m[1][0] * x + m[1][1] * y + m[1][2]) / w,
        ]
    }

    /// Maps interleaved `x, y` pairs from `src` into `dst`.
    ///
    /// Points with `w == 0` are copied through unchanged.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `src` has odd length or `dst` is shorter
    /// than `src`.
    pub fn transform_points<S: Coord, D: Coord>(&self, src: &[S], dst: &mut [D]) -> Result<()> {
        check_pairs(src.len(), dst.len())?;
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            let [x, y] = self.map_or_pass(s[0].to_f64(), s[1].to_f64());
            d[0] = D::from_f64(x);
            d[1] = D::from_f64(y);
        }
        Ok(())
    }

    /// Maps interleaved `x, y` pairs in place, with the same `w == 0`
    /// pass-through as [`transform_points`](Self::transform_points).
    pub fn transform_points_in_place<C: Coord>(&self, pts: &mut [C]) -> Result<()> {
        check_pairs(pts.len(), pts.len())?;
        for p in pts.chunks_exact_mut(2) {
            let [x, y] = self.map_or_pass(p[0].to_f64(), p[1].to_f64());
            p[0] = C::from_f64(x);
            p[1] = C::from_f64(y);
        }
        Ok(())
    }

    /// Maps one point through the inverse without forming it.
    ///
    /// # Errors
    ///
    /// [`Error::NonInvertible`] if the inverse divisor is below
    /// [`PERSPECTIVE_DIVIDE_EPSILON`] in magnitude.
    pub fn inverse_transform_point(&self, [x, y]: [f64; 2]) -> Result<[f64; 2]> {
        let (tmp_x, tmp_y, w) = self.inverse_terms(x, y);
        if w.abs() < PERSPECTIVE_DIVIDE_EPSILON {
            return Err(Error::non_invertible(format!(
                "inverse divisor vanishes at ({x}, {y})"
            )));
        }
        Ok([tmp_x / w, tmp_y / w])
    }

    /// Maps interleaved pairs through the inverse.
    ///
    /// Every point is checked before any output is written, so on error
    /// `dst` is untouched.
    pub fn inverse_transform_points<S: Coord, D: Coord>(
        &self,
        src: &[S],
        dst: &mut [D],
    ) -> Result<()> {
        check_pairs(src.len(), dst.len())?;
        for s in src.chunks_exact(2) {
            let (x, y) = (s[0].to_f64(), s[1].to_f64());
            let (_, _, w) = self.inverse_terms(x, y);
            if w.abs() < PERSPECTIVE_DIVIDE_EPSILON {
                return Err(Error::non_invertible(format!(
                    "inverse divisor vanishes at ({x}, {y})"
                )));
            }
        }
        for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
            let (tmp_x, tmp_y, w) = self.inverse_terms(s[0].to_f64(), s[1].to_f64());
            d[0] = D::from_f64(tmp_x / w);
            d[1] = D::from_f64(tmp_y / w);
        }
        Ok(())
    }

    /// Returns `true` if this maps every point to itself.
    pub fn is_identity(&self) -> bool {
        let m = &self.m;
        m[0][1] == 0.0
            && m[0][2] == 0.0
            && m[1][0] == 0.0
            && m[1][2] == 0.0
            && m[2][0] == 0.0
            && m[2][1] == 0.0
            && m[2][2] != 0.0
            && m[0][0] / m[2][2] == 1.0
            && m[1][1] / m[2][2] == 1.0
    }

    #[inline]
    fn map_or_pass(&self, x: f64, y: f64) -> [f64; 2] {
        let m = &self.m;
        let w = m[2][0] * x + m[2][1] * y + m[2][2];
        if w == 0.0 {
            [x, y]
        } else {
            [
                (m[0][0] * x + m[0][1] * y + m[0][2]) / w,
                (m[1][0] * x + m[1][1] * y + m[1][2]) / w,
            ]
        }
    }

    #[inline]
    fn inverse_terms(&self, x: f64, y: f64) -> (f64, f64, f64) {
        let m = &self.m;
        let tmp_x = (m[1][1] * m[2][2] - m[1][2] * m[2][1]) * x
            + (m[0][2] * m[2][1] - m[0][1] * m[2][2]) * y
            + (m[0][1] * m[1][2] - m[0][2] * m[1][1]);
        let tmp_y = (m[1][2] * m[2][0] - m[1][0] * m[2][2]) * x
            + (m[0][0] * m[2][2] - m[0][2] * m[2][0]) * y
            + (m[0][2] * m[1][0] - m[0][0] * m[1][2]);
        let w = (m[1][0] * m[2][1] - m[1][1] * m[2][0]) * x
            + (m[0][1] * m[2][0] - m[0][0] * m[2][1]) * y
            + (m[0][0] * m[1][1] - m[0][1] * m[1][0]);
        (tmp_x, tmp_y, w)
    }

    fn make_adjoint(&mut self) {
        let m = self.m;
        self.m = [
            [
                m[1][1] * m[2][2] - m[1][2] * m[2][1],
                m[0][2] * m[2][1] - m[0][1] * m[2][2],
                m[0][1] * m[1][2] - m[0][2] * m[1][1],
            ],
            [
                m[1][2] * m[2][0] - m[1][0] * m[2][2],
                m[0][0] * m[2][2] - m[0][2] * m[2][0],
                m[0][2] * m[1][0] - m[0][0] * m[1][2],
            ],
            [
                m[1][0] * m[2][1] - m[1][1] * m[2][0],
                m[0][1] * m[2][0] - m[0][0] * m[2][1],
                m[0][0] * m[1][1] - m[0][1] * m[1][0],
            ],
        ];
    }

    fn normalize(&mut self) {
        let invscale = 1.0 / self.m[2][2];
        for row in self.m.iter_mut() {
            for v in row.iter_mut() {
                *v *= invscale;
            }
        }
        self.m[2][2] = 1.0;
    }
}

impl fmt::Display for PerspectiveTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Perspective transform matrix")?;
        for row in &self.m {
            writeln!(f, "{}\t{}\t{}", row[0], row[1], row[2])?;
        }
        Ok(())
    }
}

fn affine_matrix(tx: &AffineTransform) -> Matrix {
    [
        [tx.scale_x(), tx.shear_x(), tx.translate_x()],
        [tx.shear_y(), tx.scale_y(), tx.translate_y()],
        [0.0, 0.0, 1.0],
    ]
}

/// `a * b`, computed into a fresh matrix.
fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    let mut out = [[0.0; 3]; 3];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, v) in row.iter_mut().enumerate() {
            *v = a[r][0] * b[0][c] + a[r][1] * b[1][c] + a[r][2] * b[2][c];
        }
    }
    out
}

fn check_pairs(src_len: usize, dst_len: usize) -> Result<()> {
    if src_len % 2 != 0 {
        return Err(Error::invalid_argument(format!(
            "point array length {src_len} is not a whole number of x,y pairs"
        )));
    }
    if dst_len < src_len {
        return Err(Error::invalid_argument(format!(
            "destination holds {dst_len} coordinates, {src_len} required"
        )));
    }
    Ok(())
}

//! 2D affine transforms.
//!
//! [`AffineTransform`] is the 2x3 special case of a projective map:
//!
//! ```text
//! | m00 m01 m02 |   | x |
//! | m10 m11 m12 | * | y |
//! |  0   0   1  |   | 1 |
//! ```
//!
//! It exists mainly to be composed with a
//! [`PerspectiveTransform`](crate::PerspectiveTransform), which treats it as
//! a 3x3 matrix with bottom row `[0, 0, 1]`.

/// Affine map `x' = m00*x + m01*y + m02`, `y' = m10*x + m11*y + m12`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AffineTransform {
    m00: f64,
    m10: f64,
    m01: f64,
    m11: f64,
    m02: f64,
    m12: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform {
    /// Identity transform.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Creates a transform from components in `(m00, m10, m01, m11, m02, m12)` order.
    #[inline]
    pub const fn new(m00: f64, m10: f64, m01: f64, m11: f64, m02: f64, m12: f64) -> Self {
        Self {
            m00,
            m10,
            m01,
            m11,
            m02,
            m12,
        }
    }

    /// Translation by `(tx, ty)`.
    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Scale by `(sx, sy)`.
    pub const fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `theta` radians. Positive angles turn +X towards +Y.
    pub fn rotation(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Shear: `x' = x + shx*y`, `y' = shy*x + y`.
    pub const fn shearing(shx: f64, shy: f64) -> Self {
        Self::new(1.0, shy, shx, 1.0, 0.0, 0.0)
    }

    /// X scale component (`m00`).
    #[inline]
    pub fn scale_x(&self) -> f64 {
        self.m00
    }

    /// Y scale component (`m11`).
    #[inline]
    pub fn scale_y(&self) -> f64 {
        self.m11
    }

    /// X shear component (`m01`).
    #[inline]
    pub fn shear_x(&self) -> f64 {
        self.m01
    }

    /// Y shear component (`m10`).
    #[inline]
    pub fn shear_y(&self) -> f64 {
        self.m10
    }

    /// X translation (`m02`).
    #[inline]
    pub fn translate_x(&self) -> f64 {
        self.m02
    }

    /// Y translation (`m12`).
    #[inline]
    pub fn translate_y(&self) -> f64 {
        self.m12
    }

    /// Determinant of the linear part.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    /// Composes `tx` to run first: `self = self * tx`.
    pub fn concatenate(&mut self, tx: &AffineTransform) {
        let m00 = self.m00 * tx.m00 + self.m01 * tx.m10;
        let m01 = self.m00 * tx.m01 + self.m01 * tx.m11;
        let m02 = self.m00 * tx.m02 + self.m01 * tx.m12 + self.m02;
        let m10 = self.m10 * tx.m00 + self.m11 * tx.m10;
        let m11 = self.m10 * tx.m01 + self.m11 * tx.m11;
        let m12 = self.m10 * tx.m02 + self.m11 * tx.m12 + self.m12;
        *self = Self::new(m00, m10, m01, m11, m02, m12);
    }

    /// Maps a point.
    #[inline]
    pub fn transform_point(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        [
            self.m00 * x + self.m01 * y + self.m02,
            self.m10 * x + self.m11 * y + self.m12,
        ]
    }

    /// Returns `true` for the exact identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

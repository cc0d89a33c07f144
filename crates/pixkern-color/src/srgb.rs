//! sRGB transfer curve and the fixed CIEXYZ <-> sRGB conversion.
//!
//! CIEXYZ values are relative to the D50 white point. The D50 <-> D65
//! chromatic adaptation is folded into the matrix coefficients, so the
//! conversion is a single 3x3 product plus the sRGB curve.
//!
//! # Formula
//!
//! Encode (linear -> sRGB), after clipping to `[0, 1]`:
//! ```text
//! C' = 12.92 * C                    if C < 0.0031308
//! C' = 1.055 * C^(1/2.4) - 0.055    otherwise
//! ```
//!
//! Decode (sRGB -> linear):
//! ```text
//! C = C' / 12.92                        if C' < 0.040449936
//! C = ((C' + 0.055) / 1.055)^2.4        otherwise
//! ```
//!
//! # Usage
//!
//! ```rust
//! use pixkern_color::srgb;
//!
//! let xyz = srgb::rgb_to_xyz([0.2, 0.5, 0.7]);
//! let rgb = srgb::xyz_to_rgb(xyz);
//! assert!((rgb[1] - 0.5).abs() < 1e-4);
//! ```

use std::sync::LazyLock;

/// Upper bound of integral CIEXYZ encodings, `1 + 32767/32768`.
pub const MAX_XYZ: f32 = 1.0 + 32767.0 / 32768.0;

const POWER: f64 = 1.0 / 2.4;

/// CIEXYZ -> linear sRGB, row major.
pub const XYZ_TO_RGB: [[f32; 3]; 3] = [
    [2.9311227, -1.4111496, -0.6038046],
    [-0.87637005, 1.7219844, 0.0502565],
    [0.05038065, -0.187272, 1.280027],
];

/// Linear sRGB -> CIEXYZ, row major.
pub const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.45593763, 0.39533819, 0.19954964],
    [0.23157515, 0.77905262, 0.07864978],
    [0.01593493, 0.09841772, 0.78488615],
];

/// [`RGB_TO_XYZ`] at double precision, used with the byte decode table.
pub const RGB_TO_XYZ_F64: [[f64; 3]; 3] = [
    [0.45593763, 0.39533819, 0.19954964],
    [0.23157515, 0.77905262, 0.07864978],
    [0.01593493, 0.09841772, 0.78488615],
];

static DECODE_TABLE: LazyLock<[f64; 256]> = LazyLock::new(|| {
    let mut table = [0.0; 256];
    for (i, v) in table.iter_mut().enumerate() {
        *v = eotf(i as f64 / 255.0);
    }
    table
});

/// sRGB decode (EOTF) at double precision.
#[inline]
pub fn eotf(v: f64) -> f64 {
    if v < 0.040449936 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// sRGB decode of an f32 sample.
///
/// The linear segment stays in single precision; the power segment is
/// evaluated in double precision and narrowed.
#[inline]
pub fn eotf_f32(v: f32) -> f32 {
    if v < 0.040449936 {
        v / 12.92
    } else {
        ((v as f64 + 0.055) / 1.055).powf(2.4) as f32
    }
}

/// sRGB encode (OETF), clipping the input to `[0, 1]` first.
#[inline]
pub fn oetf(c: f32) -> f32 {
    let c = if c < 0.0 { 0.0 } else { c };
    if c < 0.0031308 {
        12.92 * c
    } else {
        let c = if c > 1.0 { 1.0 } else { c };
        (1.055 * (c as f64).powf(POWER) - 0.055) as f32
    }
}

/// Decoded linear value of every 8-bit sRGB code.
pub fn decode_table() -> &'static [f64; 256] {
    &DECODE_TABLE
}

#[inline]
fn mul3(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Linear sRGB at double precision -> CIEXYZ.
#[inline]
pub fn linear_rgb_to_xyz_f64(rgb: [f64; 3]) -> [f64; 3] {
    let m = &RGB_TO_XYZ_F64;
    [
        m[0][0] * rgb[0] + m[0][1] * rgb[1] + m[0][2] * rgb[2],
        m[1][0] * rgb[0] + m[1][1] * rgb[1] + m[1][2] * rgb[2],
        m[2][0] * rgb[0] + m[2][1] * rgb[1] + m[2][2] * rgb[2],
    ]
}

/// CIEXYZ -> gamma-encoded sRGB in `[0, 1]`.
pub fn xyz_to_rgb(xyz: [f32; 3]) -> [f32; 3] {
    mul3(&XYZ_TO_RGB, xyz).map(oetf)
}

/// Gamma-encoded sRGB -> CIEXYZ.
pub fn rgb_to_xyz(rgb: [f32; 3]) -> [f32; 3] {
    mul3(&RGB_TO_XYZ, rgb.map(eotf_f32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_curve_segments() {
        assert_eq!(oetf(0.0), 0.0);
        assert_eq!(oetf(-0.5), 0.0);
        assert_relative_eq!(oetf(0.001), 0.01292, epsilon = 1e-7);
        assert_relative_eq!(oetf(1.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(oetf(3.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(eotf(1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(eotf(0.04), 0.04 / 12.92, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_inverts() {
        for i in 0..=20 {
            let c = i as f32 / 20.0;
            assert_relative_eq!(eotf_f32(oetf(c)), c, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_decode_table() {
        let t = decode_table();
        assert_eq!(t[0], 0.0);
        assert_relative_eq!(t[255], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t[128], eotf(128.0 / 255.0));
        assert!(t.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_matrices_are_inverse() {
        for rgb in [[1.0, 1.0, 1.0], [0.2, 0.5, 0.7], [0.9, 0.1, 0.3]] {
            let back = xyz_to_rgb(rgb_to_xyz(rgb));
            for c in 0..3 {
                assert_relative_eq!(back[c], rgb[c], epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_out_of_gamut_is_clipped() {
        let rgb = xyz_to_rgb([0.0, 1.0, 0.0]);
        // Pure Y drives red and blue negative.
        assert_eq!(rgb[0], 0.0);
        assert_eq!(rgb[2], 0.0);
        assert_relative_eq!(rgb[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_white_maps_to_white() {
        let xyz = rgb_to_xyz([1.0, 1.0, 1.0]);
        assert_relative_eq!(xyz[0], 1.0508255, epsilon = 1e-5);
        assert_relative_eq!(xyz[1], 1.0892775, epsilon = 1e-5);
        assert_relative_eq!(xyz[2], 0.8992388, epsilon = 1e-5);
    }
}

//! Device color spaces and the CIEXYZ <-> sRGB region transforms.
//!
//! A [`ColorSpaceJai`] maps between its own device components and two
//! connection spaces, CIEXYZ (D50) and sRGB. Besides single colors it
//! converts whole [`PixelRegion`]s, honouring per-component bit depths.
//!
//! # Region conventions
//!
//! Every region conversion takes:
//!
//! - `src` - a 3-band source region
//! - `src_sizes` - significant bits per source component, defaulting to
//!   the storage width
//! - `dest` - an optional 3-band destination of the same size; when absent
//!   one is allocated with the source storage type
//! - `dest_sizes` - significant bits per destination component
//!
//! Integral samples are digital codes normalized by `2^bits - 1`. Integral
//! CIEXYZ codes span `[0, 1 + 32767/32768]`; integral sRGB codes span
//! `[0, 1]`. Float samples carry the values directly.
//!
//! Integral destinations are rounded to the nearest code and stored in the
//! unsigned interpretation of the storage width, so a `Short` destination
//! holding 16-bit codes wraps codes above 32767 to negative values.

use std::fmt;

use pixkern_core::{Error, PixelRegion, Result, SampleType};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::pixels::{max_code, read_codes, write_values};
use crate::srgb::{self, MAX_XYZ};

/// Family of a color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpaceType {
    /// CIE XYZ.
    Xyz,
    /// CIE L*a*b*.
    Lab,
    /// CIE L*u*v*.
    Luv,
    /// YCbCr.
    YCbCr,
    /// CIE Yxy.
    Yxy,
    /// RGB.
    Rgb,
    /// Single-channel gray.
    Gray,
    /// Hue/saturation/value family, including IHS.
    Hsv,
    /// Hue/lightness/saturation.
    Hls,
    /// CMYK.
    Cmyk,
    /// CMY.
    Cmy,
}

/// A device color space with single-color and region conversions.
///
/// The region conversions to and from CIEXYZ default to a hop through the
/// sRGB ones, which suits spaces whose
/// [`is_rgb_preferred_intermediary`](Self::is_rgb_preferred_intermediary)
/// is `true`.
pub trait ColorSpaceJai: Send + Sync + fmt::Debug {
    /// Family of this space.
    fn color_space_type(&self) -> ColorSpaceType;

    /// Number of device components.
    fn num_components(&self) -> usize;

    /// Whether chaining through sRGB loses less than chaining through CIEXYZ.
    fn is_rgb_preferred_intermediary(&self) -> bool;

    /// Device color -> sRGB.
    ///
    /// # Errors
    ///
    /// [`Error::BandMismatch`] if `color` has the wrong component count.
    fn to_rgb(&self, color: &[f32]) -> Result<[f32; 3]>;

    /// sRGB -> device color.
    fn from_rgb(&self, rgb: [f32; 3]) -> Vec<f32>;

    /// Device color -> CIEXYZ.
    fn to_ciexyz(&self, color: &[f32]) -> Result<[f32; 3]> {
        Ok(srgb::rgb_to_xyz(self.to_rgb(color)?))
    }

    /// CIEXYZ -> device color.
    fn from_ciexyz(&self, xyz: [f32; 3]) -> Vec<f32> {
        self.from_rgb(srgb::xyz_to_rgb(xyz))
    }

    /// Device region -> sRGB region.
    fn to_rgb_region(
        &self,
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<PixelRegion>;

    /// sRGB region -> device region.
    fn from_rgb_region(
        &self,
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<PixelRegion>;

    /// Device region -> CIEXYZ region.
    fn to_ciexyz_region(
        &self,
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<PixelRegion> {
        let rgb = self.to_rgb_region(src, src_sizes, None, None)?;
        rgb_to_ciexyz(&rgb, None, dest, dest_sizes)
    }

    /// CIEXYZ region -> device region.
    fn from_ciexyz_region(
        &self,
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<PixelRegion> {
        let rgb = ciexyz_to_rgb(src, src_sizes, None, None)?;
        self.from_rgb_region(&rgb, None, dest, dest_sizes)
    }
}

/// Validates the arguments of a 3-band region conversion.
///
/// # Errors
///
/// - [`Error::BandMismatch`] if either region does not have 3 bands
/// - [`Error::UnsupportedFormat`] if either region holds 1-bit samples
/// - [`Error::InvalidArgument`] if a size array is not 3 long, a size lies
///   outside `1..=storage bits`, or `dest` differs in width or height
pub fn check_parameters(
    src: &PixelRegion,
    src_sizes: Option<&[u32]>,
    dest: Option<&PixelRegion>,
    dest_sizes: Option<&[u32]>,
) -> Result<()> {
    check_region(src)?;
    check_sizes("source", src_sizes, src.sample_type())?;
    let dest_type = match dest {
        Some(dest) => {
            check_region(dest)?;
            if !src.same_size(dest) {
                return Err(Error::invalid_argument(format!(
                    "destination is {}x{}, source is {}x{}",
                    dest.width(),
                    dest.height(),
                    src.width(),
                    src.height()
                )));
            }
            dest.sample_type()
        }
        None => src.sample_type(),
    };
    check_sizes("destination", dest_sizes, dest_type)
}

fn check_region(region: &PixelRegion) -> Result<()> {
    if region.num_bands() != 3 {
        return Err(Error::band_mismatch(3, region.num_bands()));
    }
    if region.sample_type() == SampleType::Bit {
        return Err(Error::unsupported_format(SampleType::Bit.name()));
    }
    Ok(())
}

fn check_sizes(role: &str, sizes: Option<&[u32]>, ty: SampleType) -> Result<()> {
    let Some(sizes) = sizes else {
        return Ok(());
    };
    if sizes.len() != 3 {
        return Err(Error::invalid_argument(format!(
            "{role} component sizes must have 3 entries, got {}",
            sizes.len()
        )));
    }
    if let Some(&bad) = sizes.iter().find(|&&s| s == 0 || s > ty.bits()) {
        return Err(Error::invalid_argument(format!(
            "{role} component size {bad} outside 1..={} for {ty} samples",
            ty.bits()
        )));
    }
    Ok(())
}

/// A validated conversion: resolved sizes and the destination to fill.
#[derive(Debug)]
pub(crate) struct Conversion {
    pub src_sizes: [u32; 3],
    pub dest: PixelRegion,
    pub dest_sizes: [u32; 3],
}

impl Conversion {
    pub(crate) fn prepare(
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<Self> {
        check_parameters(src, src_sizes, dest.as_ref(), dest_sizes)?;
        let dest =
            dest.unwrap_or_else(|| PixelRegion::zeroed(src.bounds(), 3, src.sample_type()));
        let src_sizes = resolve_sizes(src_sizes, src.sample_type());
        let dest_sizes = resolve_sizes(dest_sizes, dest.sample_type());
        Ok(Self {
            src_sizes,
            dest,
            dest_sizes,
        })
    }

    /// Per-channel destination full scale: `2^bits - 1` or `1.0` for floats.
    pub(crate) fn dest_upper(&self) -> [f64; 3] {
        if self.dest.sample_type().is_integral() {
            self.dest_sizes.map(max_code)
        } else {
            [1.0; 3]
        }
    }
}

/// Scale taking a `bits`-wide CIEXYZ code to its tristimulus value, formed in
/// `f64` and narrowed once.
#[inline]
pub(crate) fn xyz_code_scale(bits: u32) -> f32 {
    (MAX_XYZ as f64 / max_code(bits)) as f32
}

fn resolve_sizes(sizes: Option<&[u32]>, ty: SampleType) -> [u32; 3] {
    match sizes {
        Some(&[a, b, c]) => [a, b, c],
        _ => [ty.bits(); 3],
    }
}

/// Converts a CIEXYZ region to gamma-encoded sRGB.
///
/// RGB is clipped to `[0, 1]` before encoding.
///
/// # Errors
///
/// See [`check_parameters`].
pub fn ciexyz_to_rgb(
    src: &PixelRegion,
    src_sizes: Option<&[u32]>,
    dest: Option<PixelRegion>,
    dest_sizes: Option<&[u32]>,
) -> Result<PixelRegion> {
    let mut job = Conversion::prepare(src, src_sizes, dest, dest_sizes)?;
    debug!(
        width = src.width(),
        height = src.height(),
        src_type = %src.sample_type(),
        dest_type = %job.dest.sample_type(),
        "CIEXYZ to sRGB"
    );

    let scale = src
        .sample_type()
        .is_integral()
        .then(|| job.src_sizes.map(xyz_code_scale));
    let upper = job.dest_upper();

    let out: Vec<[f64; 3]> = read_codes(src)?
        .into_iter()
        .map(|c| {
            let xyz = match scale {
                Some(s) => [c[0] as f32 * s[0], c[1] as f32 * s[1], c[2] as f32 * s[2]],
                None => c.map(|v| v as f32),
            };
            let rgb = srgb::xyz_to_rgb(xyz);
            [0, 1, 2].map(|i| upper[i] * rgb[i] as f64)
        })
        .collect();

    write_values(&mut job.dest, &out)?;
    Ok(job.dest)
}

/// Converts a gamma-encoded sRGB region to CIEXYZ.
///
/// Byte sources decode through the 256-entry table of
/// [`srgb::decode_table`]; a component narrower than 8 bits is shifted up
/// to 8 bits first.
///
/// # Errors
///
/// See [`check_parameters`].
pub fn rgb_to_ciexyz(
    src: &PixelRegion,
    src_sizes: Option<&[u32]>,
    dest: Option<PixelRegion>,
    dest_sizes: Option<&[u32]>,
) -> Result<PixelRegion> {
    let mut job = Conversion::prepare(src, src_sizes, dest, dest_sizes)?;
    debug!(
        width = src.width(),
        height = src.height(),
        src_type = %src.sample_type(),
        dest_type = %job.dest.sample_type(),
        "sRGB to CIEXYZ"
    );

    let norm = if job.dest.sample_type().is_integral() {
        job.dest_sizes.map(|b| max_code(b) / MAX_XYZ as f64)
    } else {
        [1.0; 3]
    };
    let codes = read_codes(src)?;

    let out: Vec<[f64; 3]> = match src.sample_type() {
        SampleType::Byte => {
            let table = srgb::decode_table();
            let shift = job.src_sizes.map(|b| 8 - b);
            codes
                .iter()
                .map(|c| {
                    let linear = [0, 1, 2].map(|i| table[((c[i] as usize) << shift[i]) & 0xFF]);
                    let xyz = srgb::linear_rgb_to_xyz_f64(linear);
                    [0, 1, 2].map(|i| xyz[i] * norm[i])
                })
                .collect()
        }
        ty if ty.is_integral() => {
            let max = job.src_sizes.map(|b| max_code(b) as f32);
            codes
                .iter()
                .map(|c| {
                    let rgb = [0, 1, 2].map(|i| c[i] as f32 / max[i]);
                    let xyz = srgb::rgb_to_xyz(rgb);
                    [0, 1, 2].map(|i| xyz[i] as f64 * norm[i])
                })
                .collect()
        }
        _ => codes
            .iter()
            .map(|c| {
                let xyz = srgb::rgb_to_xyz(c.map(|v| v as f32));
                [0, 1, 2].map(|i| xyz[i] as f64 * norm[i])
            })
            .collect(),
    };

    write_values(&mut job.dest, &out)?;
    Ok(job.dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pixkern_core::Rect;

    fn rgb_pixel<T: Copy>(values: [T; 3]) -> PixelRegion
    where
        Vec<T>: Into<pixkern_core::SampleBuffer>,
    {
        PixelRegion::interleaved(Rect::from_size(1, 1), 3, values.to_vec()).unwrap()
    }

    #[test]
    fn test_check_parameters_bands() {
        let one = PixelRegion::zeroed(Rect::from_size(2, 2), 1, SampleType::Byte);
        let three = PixelRegion::zeroed(Rect::from_size(2, 2), 3, SampleType::Byte);
        assert_eq!(
            check_parameters(&one, None, None, None),
            Err(Error::band_mismatch(3, 1))
        );
        assert_eq!(
            check_parameters(&three, None, Some(&one), None),
            Err(Error::band_mismatch(3, 1))
        );
        assert!(check_parameters(&three, None, Some(&three), None).is_ok());
    }

    #[test]
    fn test_check_parameters_sizes() {
        let src = PixelRegion::zeroed(Rect::from_size(2, 2), 3, SampleType::Byte);
        assert!(check_parameters(&src, Some(&[8, 8]), None, None).unwrap_err().is_invalid_argument());
        assert!(check_parameters(&src, Some(&[8, 9, 8]), None, None).is_err());
        assert!(check_parameters(&src, Some(&[8, 0, 8]), None, None).is_err());
        assert!(check_parameters(&src, Some(&[5, 6, 5]), None, Some(&[8, 8, 8])).is_ok());

        // Destination sizes are checked against the destination storage.
        let dest = PixelRegion::zeroed(Rect::from_size(2, 2), 3, SampleType::UShort);
        assert!(check_parameters(&src, None, Some(&dest), Some(&[16, 16, 16])).is_ok());
        assert!(check_parameters(&src, None, None, Some(&[16, 16, 16])).is_err());
    }

    #[test]
    fn test_check_parameters_geometry_and_format() {
        let src = PixelRegion::zeroed(Rect::from_size(2, 2), 3, SampleType::Float);
        let small = PixelRegion::zeroed(Rect::from_size(2, 1), 3, SampleType::Float);
        assert!(check_parameters(&src, None, Some(&small), None).unwrap_err().is_invalid_argument());

        let bits = PixelRegion::bits(Rect::from_size(1, 1), 3, vec![0, 1, 0]).unwrap();
        assert!(check_parameters(&bits, None, None, None).unwrap_err().is_format_error());
    }

    #[test]
    fn test_default_destination_matches_source() {
        let src = rgb_pixel([0.2f32, 0.3, 0.4]);
        let dest = rgb_to_ciexyz(&src, None, None, None).unwrap();
        assert_eq!(dest.sample_type(), SampleType::Float);
        assert_eq!(dest.bounds(), src.bounds());
        assert_eq!(dest.num_bands(), 3);
    }

    #[test]
    fn test_float_round_trip() {
        let src = rgb_pixel([0.2f32, 0.5, 0.7]);
        let xyz = rgb_to_ciexyz(&src, None, None, None).unwrap();
        let expected = srgb::rgb_to_xyz([0.2, 0.5, 0.7]);
        assert_eq!(xyz.samples::<f32>().unwrap(), &expected[..]);

        let rgb = ciexyz_to_rgb(&xyz, None, None, None).unwrap();
        let rgb = rgb.samples::<f32>().unwrap();
        for (got, want) in rgb.iter().zip([0.2, 0.5, 0.7]) {
            assert_relative_eq!(*got, want, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_byte_white_to_xyz_codes() {
        let src = rgb_pixel([255u8, 255, 255]);
        let xyz = rgb_to_ciexyz(&src, None, None, None).unwrap();
        let norm = 255.0 / MAX_XYZ as f64;
        let white = srgb::decode_table()[255];
        let expected = srgb::linear_rgb_to_xyz_f64([white; 3]).map(|v| (v * norm + 0.5) as u8);
        assert_eq!(xyz.samples::<u8>().unwrap(), &expected[..]);
    }

    #[test]
    fn test_byte_round_trip_is_close() {
        for rgb in [[255u8, 255, 255], [200, 40, 90], [10, 128, 250], [0, 0, 0]] {
            let src = rgb_pixel(rgb);
            let dest = PixelRegion::zeroed(src.bounds(), 3, SampleType::UShort);
            let xyz = rgb_to_ciexyz(&src, None, Some(dest), None).unwrap();
            let back = ciexyz_to_rgb(&xyz, None, Some(PixelRegion::zeroed(src.bounds(), 3, SampleType::Byte)), None)
                .unwrap();
            for (got, want) in back.samples::<u8>().unwrap().iter().zip(rgb) {
                assert!((*got as i32 - want as i32).abs() <= 1, "{rgb:?} -> {got}");
            }
        }
    }

    #[test]
    fn test_reduced_byte_sizes_shift_up() {
        // A 4-bit code of 8 decodes like the byte code 128.
        let narrow = rgb_to_ciexyz(&rgb_pixel([8u8, 8, 8]), Some(&[4, 4, 4]), None, None).unwrap();
        let wide = rgb_to_ciexyz(&rgb_pixel([128u8, 128, 128]), None, None, None).unwrap();
        assert_eq!(narrow.samples::<u8>(), wide.samples::<u8>());
    }

    #[test]
    fn test_short_destination_wraps() {
        let src = rgb_pixel([1.0f32, 1.0, 1.0]);
        let dest = PixelRegion::zeroed(src.bounds(), 3, SampleType::Short);
        let rgb = ciexyz_to_rgb(&rgb_pixel([0.9642f32, 1.0, 0.8249]), None, Some(dest), None).unwrap();
        // Every channel of this colour encodes above 32767 in 16 bits.
        assert!(rgb.samples::<i16>().unwrap().iter().all(|&v| v < 0));

        let xyz = rgb_to_ciexyz(&src, None, Some(PixelRegion::zeroed(src.bounds(), 3, SampleType::Short)), None)
            .unwrap();
        let codes: Vec<u16> = xyz.samples::<i16>().unwrap().iter().map(|&v| v as u16).collect();
        let norm = 65535.0 / MAX_XYZ as f64;
        let expected = srgb::rgb_to_xyz([1.0; 3]).map(|v| (v as f64 * norm + 0.5) as u16);
        assert_eq!(codes, expected);
    }

    #[test]
    fn test_xyz_code_scale_narrows_once() {
        for bits in [8, 12, 16, 32] {
            let wide = MAX_XYZ as f64 / ((1u64 << bits) - 1) as f64;
            assert_eq!(xyz_code_scale(bits), wide as f32, "{bits} bits");
        }
        // Full-scale 16-bit code decodes to the top of the XYZ range.
        assert_relative_eq!(65535.0 * xyz_code_scale(16), MAX_XYZ, epsilon = 1e-6);
    }
}

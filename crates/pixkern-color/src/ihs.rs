//! The IHS (intensity, hue, saturation) color space.
//!
//! # Formula
//!
//! RGB -> IHS, with `R, G, B` clipped to `[0, 1]`:
//! ```text
//! I = (R + G + B) / 3
//! H = acos(((R-G) + (R-B)) / (2 * sqrt((R-G)^2 + (R-B)(G-B))))
//! H = 2pi - H                     if G < B
//! H = 2pi                         if R = G = B
//! S = 1 - min(R, G, B) / I        (S = 0 when I = 0)
//! ```
//!
//! IHS -> RGB isolates the channel whose spoke is opposite the hue sector:
//! red for `[2pi/3, 4pi/3)`, green for `[4pi/3, 2pi]`, blue for `[0, 2pi/3)`.
//! With `x = (1 - S) * I` the isolated channel equals `x`, and the other two
//! follow from `c1 = 3I - x` and `c2 = sqrt(3) * (x - I) * tan(H - phase)`.
//!
//! # Regions
//!
//! Integral IHS codes map `I` and `S` onto `[0, 2^bits - 1]` and `H` from
//! `[0, 2pi]` onto the same range. Float regions store radians.
//!
//! When both regions hold bytes the conversion runs on the lookup tables of
//! [`IhsTables`] instead of trigonometric calls. The results agree with the
//! float path to within a code or two.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_color::{ColorSpaceJai, IhsColorSpace};
//!
//! let ihs = IhsColorSpace::instance();
//! let white = ihs.from_rgb([1.0, 1.0, 1.0]);
//! assert_eq!(white, vec![1.0, std::f32::consts::TAU, 0.0]);
//! ```

use std::f64::consts::{FRAC_PI_3, TAU};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use pixkern_core::{Error, PixelRegion, Result, SampleType};
#[allow(unused_imports)]
use tracing::{debug, trace};

use crate::jai::{ColorSpaceJai, ColorSpaceType, Conversion};
use crate::pixels::{max_code, read_codes, write_values};
use crate::srgb;
use crate::tables::IhsTables;

const SQRT_3: f64 = 1.732_050_807_568_877_2;
const PI_2_3: f64 = 2.0 * FRAC_PI_3;
const PI_4_3: f64 = 4.0 * FRAC_PI_3;

static SHARED: Mutex<Weak<IhsColorSpace>> = Mutex::new(Weak::new());

/// sRGB -> IHS for a single color.
pub fn rgb_to_ihs(rgb: [f32; 3]) -> [f32; 3] {
    rgb_to_ihs_f64(rgb.map(f64::from)).map(|v| v as f32)
}

/// IHS -> sRGB for a single color.
///
/// Inputs are clipped to `I, S` in `[0, 1]` and `H` in `[0, 2pi]`. The
/// result is not clipped.
pub fn ihs_to_rgb(ihs: [f32; 3]) -> [f32; 3] {
    ihs_to_rgb_f64(ihs.map(f64::from)).map(|v| v as f32)
}

/// CIEXYZ -> IHS, through sRGB.
pub fn ciexyz_to_ihs(xyz: [f32; 3]) -> [f32; 3] {
    rgb_to_ihs(srgb::xyz_to_rgb(xyz))
}

/// IHS -> CIEXYZ, through sRGB.
pub fn ihs_to_ciexyz(ihs: [f32; 3]) -> [f32; 3] {
    srgb::rgb_to_xyz(ihs_to_rgb(ihs))
}

fn rgb_to_ihs_f64(rgb: [f64; 3]) -> [f64; 3] {
    let [r, g, b] = rgb.map(|v| v.clamp(0.0, 1.0));
    let intensity = (r + g + b) / 3.0;

    let drg = r - g;
    let drb = r - b;
    let temp = (drg * drg + drb * (drb - drg)).sqrt();
    let hue = if temp != 0.0 {
        let h = ((drg + drb) / temp / 2.0).clamp(-1.0, 1.0).acos();
        if g < b { TAU - h } else { h }
    } else {
        TAU
    };

    let min = r.min(g).min(b);
    let saturation = if intensity == 0.0 {
        0.0
    } else {
        1.0 - min / intensity
    };
    [intensity, hue, saturation]
}

fn ihs_to_rgb_f64(ihs: [f64; 3]) -> [f64; 3] {
    let i = ihs[0].clamp(0.0, 1.0);
    let h = ihs[1].clamp(0.0, TAU);
    let s = ihs[2].clamp(0.0, 1.0);
    if s == 0.0 {
        return [i; 3];
    }

    let x = (1.0 - s) * i;
    let c1 = 3.0 * i - x;
    let offset = |phase: f64| SQRT_3 * (x - i) * (h - phase).tan();
    if (PI_2_3..PI_4_3).contains(&h) {
        let c2 = offset(0.0);
        [x, (c1 + c2) / 2.0, (c1 - c2) / 2.0]
    } else if h >= PI_4_3 {
        let c2 = offset(PI_2_3);
        [(c1 - c2) / 2.0, x, (c1 + c2) / 2.0]
    } else {
        let c2 = offset(PI_4_3);
        [(c1 + c2) / 2.0, (c1 - c2) / 2.0, x]
    }
}

/// The IHS color space: 3 components, HSV family, sRGB preferred as the
/// connection space.
#[derive(Debug, Default)]
pub struct IhsColorSpace {
    tables: Arc<IhsTables>,
}

impl IhsColorSpace {
    /// Creates a color space with its own table cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a color space reading from a shared table cache.
    pub fn with_tables(tables: Arc<IhsTables>) -> Self {
        Self { tables }
    }

    /// The shared instance.
    ///
    /// The instance lives as long as some caller holds it; once every
    /// handle is dropped the next call builds a fresh one.
    pub fn instance() -> Arc<IhsColorSpace> {
        let mut slot = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(shared) = slot.upgrade() {
            return shared;
        }
        debug!("creating shared IHS color space");
        let shared = Arc::new(Self::new());
        *slot = Arc::downgrade(&shared);
        shared
    }

    /// The lookup-table cache used by the byte paths.
    pub fn tables(&self) -> &IhsTables {
        &self.tables
    }
}

impl ColorSpaceJai for IhsColorSpace {
    fn color_space_type(&self) -> ColorSpaceType {
        ColorSpaceType::Hsv
    }

    fn num_components(&self) -> usize {
        3
    }

    fn is_rgb_preferred_intermediary(&self) -> bool {
        true
    }

    fn to_rgb(&self, color: &[f32]) -> Result<[f32; 3]> {
        match *color {
            [i, h, s] => Ok(ihs_to_rgb([i, h, s])),
            _ => Err(Error::band_mismatch(3, color.len())),
        }
    }

    fn from_rgb(&self, rgb: [f32; 3]) -> Vec<f32> {
        rgb_to_ihs(rgb).to_vec()
    }

    fn to_ciexyz(&self, color: &[f32]) -> Result<[f32; 3]> {
        match *color {
            [i, h, s] => Ok(ihs_to_ciexyz([i, h, s])),
            _ => Err(Error::band_mismatch(3, color.len())),
        }
    }

    fn from_ciexyz(&self, xyz: [f32; 3]) -> Vec<f32> {
        ciexyz_to_ihs(xyz).to_vec()
    }

    fn to_rgb_region(
        &self,
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<PixelRegion> {
        let mut job = Conversion::prepare(src, src_sizes, dest, dest_sizes)?;
        let fast = src.sample_type() == SampleType::Byte
            && job.dest.sample_type() == SampleType::Byte
            && job.src_sizes[1] == 8;
        debug!(
            width = src.width(),
            height = src.height(),
            src_type = %src.sample_type(),
            dest_type = %job.dest.sample_type(),
            table_path = fast,
            "IHS to sRGB"
        );

        let codes = read_codes(src)?;
        let out = if fast {
            self.ihs_bytes_to_rgb(&codes, &job)
        } else {
            ihs_codes_to_rgb(&codes, src.sample_type(), &job)
        };
        write_values(&mut job.dest, &out)?;
        Ok(job.dest)
    }

    fn from_rgb_region(
        &self,
        src: &PixelRegion,
        src_sizes: Option<&[u32]>,
        dest: Option<PixelRegion>,
        dest_sizes: Option<&[u32]>,
    ) -> Result<PixelRegion> {
        let mut job = Conversion::prepare(src, src_sizes, dest, dest_sizes)?;
        let fast =
            src.sample_type() == SampleType::Byte && job.dest.sample_type() == SampleType::Byte;
        debug!(
            width = src.width(),
            height = src.height(),
            src_type = %src.sample_type(),
            dest_type = %job.dest.sample_type(),
            table_path = fast,
            "sRGB to IHS"
        );

        let codes = read_codes(src)?;
        let out = if fast {
            self.rgb_bytes_to_ihs(&codes, &job)
        } else {
            rgb_codes_to_ihs(&codes, src.sample_type(), &job)
        };
        write_values(&mut job.dest, &out)?;
        Ok(job.dest)
    }
}

impl IhsColorSpace {
    /// Byte RGB -> byte IHS on the arccosine and square-root tables.
    fn rgb_bytes_to_ihs(&self, codes: &[[f64; 3]], job: &Conversion) -> Vec<[f64; 3]> {
        let acos = self.tables.acos();
        let sqrt = self.tables.sqrt();
        let up = job.src_sizes.map(|b| 8 - b);
        let down = job.dest_sizes.map(|b| 8 - b);

        codes
            .iter()
            .map(|c| {
                let [r, g, b] = [0, 1, 2].map(|i| ((c[i] as i32) << up[i]) & 0xFF);
                let intensity = (r + g + b) as f32 / 3.0;

                let drg = r - g;
                let drb = r - b;
                let tint = drg * drg + drb * (drb - drg);
                let (hue, saturation) = if tint == 0 {
                    (255, 0)
                } else {
                    let sum = drg + drb;
                    let ratio = 250.0 * (sum * sum) as f64 / tint as f64;
                    let cos = sqrt[((ratio + 0.5) as usize).min(1000)];
                    let step = (500.0 * cos + 0.5) as usize;
                    let h = i32::from(if sum > 0 { acos[500 + step] } else { acos[500 - step] });
                    let h = if g < b { 255 - h } else { h };
                    let min = r.min(g).min(b) as f32;
                    (h, 255 - (255.0 * min / intensity + 0.5) as i32)
                };

                [
                    ((intensity + 0.5) as i32 >> down[0]) as f64,
                    (hue >> down[1]) as f64,
                    (saturation >> down[2]) as f64,
                ]
            })
            .collect()
    }

    /// Byte IHS with 8-bit hue -> byte RGB on the tangent table.
    fn ihs_bytes_to_rgb(&self, codes: &[[f64; 3]], job: &Conversion) -> Vec<[f64; 3]> {
        let tan = self.tables.tan();
        let norm_i = max_code(job.src_sizes[0]);
        let norm_s = max_code(job.src_sizes[2]);
        let upper = job.dest_upper();

        codes
            .iter()
            .map(|c| {
                let i = c[0] / norm_i;
                let h = c[1] as usize & 0xFF;
                let s = c[2] / norm_s;

                let rgb = if s == 0.0 {
                    [i; 3]
                } else {
                    let x = (1.0 - s) * i;
                    let c1 = 3.0 * i - x;
                    if (85..170).contains(&h) {
                        let c2 = SQRT_3 * (x - i) * tan[h];
                        [x, (c1 + c2) / 2.0, (c1 - c2) / 2.0]
                    } else if h >= 170 {
                        let c2 = SQRT_3 * (x - i) * tan[h - 85];
                        [(c1 - c2) / 2.0, x, (c1 + c2) / 2.0]
                    } else {
                        let c2 = SQRT_3 * (x - i) * tan[h + 85];
                        [(c1 + c2) / 2.0, (c1 - c2) / 2.0, x]
                    }
                };
                [0, 1, 2].map(|k| rgb[k].clamp(0.0, 1.0) * upper[k])
            })
            .collect()
    }
}

fn rgb_codes_to_ihs(codes: &[[f64; 3]], src_type: SampleType, job: &Conversion) -> Vec<[f64; 3]> {
    let max = src_type.is_integral().then(|| job.src_sizes.map(max_code));
    let scale = if job.dest.sample_type().is_integral() {
        let upper = job.dest_upper();
        [upper[0], upper[1] / TAU, upper[2]]
    } else {
        [1.0; 3]
    };

    codes
        .iter()
        .map(|c| {
            let rgb = match max {
                Some(m) => [c[0] / m[0], c[1] / m[1], c[2] / m[2]],
                None => *c,
            };
            let ihs = rgb_to_ihs_f64(rgb);
            [0, 1, 2].map(|k| ihs[k] * scale[k])
        })
        .collect()
}

fn ihs_codes_to_rgb(codes: &[[f64; 3]], src_type: SampleType, job: &Conversion) -> Vec<[f64; 3]> {
    let scale = if src_type.is_integral() {
        let m = job.src_sizes.map(max_code);
        [1.0 / m[0], TAU / m[1], 1.0 / m[2]]
    } else {
        [1.0; 3]
    };
    let upper = job.dest_upper();

    codes
        .iter()
        .map(|c| {
            let rgb = ihs_to_rgb_f64([0, 1, 2].map(|k| c[k] * scale[k]));
            [0, 1, 2].map(|k| rgb[k].clamp(0.0, 1.0) * upper[k])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pixkern_core::Rect;
    use std::f32::consts::TAU as TAU32;

    fn byte_rgb(pixels: &[[u8; 3]]) -> PixelRegion {
        let data: Vec<u8> = pixels.iter().flatten().copied().collect();
        PixelRegion::interleaved(Rect::from_size(pixels.len() as u32, 1), 3, data).unwrap()
    }

    const COLORS: [[u8; 3]; 8] = [
        [200, 40, 90],
        [10, 128, 250],
        [255, 0, 0],
        [30, 200, 60],
        [120, 120, 121],
        [250, 250, 10],
        [64, 32, 16],
        [1, 2, 3],
    ];

    #[test]
    fn test_grey_has_full_turn_hue() {
        assert_eq!(rgb_to_ihs([1.0, 1.0, 1.0]), [1.0, TAU32, 0.0]);
        assert_eq!(rgb_to_ihs([0.0, 0.0, 0.0]), [0.0, TAU32, 0.0]);
        let grey = rgb_to_ihs([0.25, 0.25, 0.25]);
        assert_eq!(grey[1], TAU32);
        assert_eq!(grey[2], 0.0);
    }

    #[test]
    fn test_primaries() {
        let red = rgb_to_ihs([1.0, 0.0, 0.0]);
        assert_relative_eq!(red[0], 1.0 / 3.0);
        assert_eq!(red[1], 0.0);
        assert_eq!(red[2], 1.0);

        let green = rgb_to_ihs([0.0, 1.0, 0.0]);
        assert_relative_eq!(green[1], TAU32 / 3.0, epsilon = 1e-6);
        let blue = rgb_to_ihs([0.0, 0.0, 1.0]);
        assert_relative_eq!(blue[1], 2.0 * TAU32 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_inputs_are_clipped() {
        assert_eq!(rgb_to_ihs([2.0, 2.0, 2.0]), rgb_to_ihs([1.0, 1.0, 1.0]));
        assert_eq!(ihs_to_rgb([0.5, 1.0, -3.0]), [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_round_trip() {
        for rgb in [[0.2, 0.5, 0.7], [0.9, 0.1, 0.3], [0.3, 0.8, 0.1], [0.6, 0.6, 0.2]] {
            let back = ihs_to_rgb(rgb_to_ihs(rgb));
            for k in 0..3 {
                assert_relative_eq!(back[k], rgb[k], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_ciexyz_helpers_chain_through_rgb() {
        let xyz = srgb::rgb_to_xyz([0.2, 0.5, 0.7]);
        let ihs = ciexyz_to_ihs(xyz);
        let expected = rgb_to_ihs(srgb::xyz_to_rgb(xyz));
        assert_eq!(ihs, expected);

        let back = ihs_to_ciexyz(ihs);
        for k in 0..3 {
            assert_relative_eq!(back[k], xyz[k], epsilon = 1e-4);
        }
    }

    #[test]
    fn test_color_space_properties() {
        let cs = IhsColorSpace::new();
        assert_eq!(cs.color_space_type(), ColorSpaceType::Hsv);
        assert_eq!(cs.num_components(), 3);
        assert!(cs.is_rgb_preferred_intermediary());
        assert_eq!(cs.to_rgb(&[0.5, 1.0]), Err(Error::band_mismatch(3, 2)));
        assert!(cs.to_ciexyz(&[0.5, 1.0, 0.5, 0.0]).is_err());
    }

    #[test]
    fn test_shared_instance() {
        let a = IhsColorSpace::instance();
        let b = IhsColorSpace::instance();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.from_rgb([1.0, 1.0, 1.0]), vec![1.0, TAU32, 0.0]);
    }

    #[test]
    fn test_byte_table_path_matches_float_path() {
        let cs = IhsColorSpace::new();
        let src = byte_rgb(&COLORS);
        let fast = cs.from_rgb_region(&src, None, None, None).unwrap();
        assert_eq!(cs.tables().built_count(), 2);

        let float_dest = PixelRegion::zeroed(src.bounds(), 3, SampleType::Float);
        let exact = cs.from_rgb_region(&src, None, Some(float_dest), None).unwrap();

        let fast = fast.samples::<u8>().unwrap();
        let exact = exact.samples::<f32>().unwrap();
        for (p, (f, e)) in fast.chunks(3).zip(exact.chunks(3)).enumerate() {
            let expected = [e[0] as f64 * 255.0, e[1] as f64 * 255.0 / TAU, e[2] as f64 * 255.0];
            for k in 0..3 {
                let diff = (f[k] as f64 - expected[k]).abs();
                assert!(diff <= 2.0, "pixel {p} band {k}: {} vs {}", f[k], expected[k]);
            }
        }
    }

    #[test]
    fn test_byte_grey_and_black() {
        let cs = IhsColorSpace::new();
        let region = cs
            .from_rgb_region(&byte_rgb(&[[0, 0, 0], [90, 90, 90]]), None, None, None)
            .unwrap();
        assert_eq!(region.samples::<u8>().unwrap(), &[0, 255, 0, 90, 255, 0]);
    }

    #[test]
    fn test_byte_hue_codes_from_tables() {
        let cs = IhsColorSpace::new();
        let region = cs
            .from_rgb_region(&byte_rgb(&[[0, 255, 255], [0, 255, 0]]), None, None, None)
            .unwrap();
        // Cyan reads the first acos entry (127), green the 2*PI/3 entry (85).
        assert_eq!(region.samples::<u8>().unwrap(), &[170, 127, 255, 85, 85, 255]);
    }

    #[test]
    fn test_byte_ihs_to_rgb_matches_float_path() {
        let cs = IhsColorSpace::new();
        let ihs = cs.from_rgb_region(&byte_rgb(&COLORS), None, None, None).unwrap();

        let fast = cs.to_rgb_region(&ihs, None, None, None).unwrap();
        assert!(cs.tables().built_count() == 3);
        let float_dest = PixelRegion::zeroed(ihs.bounds(), 3, SampleType::Float);
        let exact = cs.to_rgb_region(&ihs, None, Some(float_dest), None).unwrap();

        for (f, e) in fast.samples::<u8>().unwrap().iter().zip(exact.samples::<f32>().unwrap()) {
            assert!((*f as f64 - *e as f64 * 255.0).abs() <= 1.0, "{f} vs {e}");
        }
    }

    #[test]
    fn test_float_region_round_trip() {
        let cs = IhsColorSpace::new();
        let data = vec![0.2f32, 0.5, 0.7, 0.9, 0.1, 0.3, 0.4, 0.4, 0.4];
        let src = PixelRegion::interleaved(Rect::from_size(3, 1), 3, data.clone()).unwrap();
        let ihs = cs.from_rgb_region(&src, None, None, None).unwrap();
        assert_eq!(&ihs.samples::<f32>().unwrap()[6..], &[0.4, TAU32, 0.0]);

        let back = cs.to_rgb_region(&ihs, None, None, None).unwrap();
        for (got, want) in back.samples::<f32>().unwrap().iter().zip(&data) {
            assert_relative_eq!(*got, *want, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_ushort_hue_scaling() {
        let cs = IhsColorSpace::new();
        let src = PixelRegion::interleaved(Rect::from_size(1, 1), 3, vec![0u16, 65535, 0]).unwrap();
        let ihs = cs.from_rgb_region(&src, None, None, None).unwrap();
        let codes = ihs.samples::<u16>().unwrap();
        assert_eq!(codes[0], 21845);
        // Green sits a third of the way round the hue circle.
        assert_eq!(codes[1], 21845);
        assert_eq!(codes[2], 65535);
    }

    #[test]
    fn test_ciexyz_region_round_trip() {
        let cs = IhsColorSpace::new();
        let data = vec![0.2f32, 0.5, 0.7];
        let src = PixelRegion::interleaved(Rect::from_size(1, 1), 3, data.clone()).unwrap();
        let xyz = crate::jai::rgb_to_ciexyz(&src, None, None, None).unwrap();

        let ihs = cs.from_ciexyz_region(&xyz, None, None, None).unwrap();
        let back = cs.to_ciexyz_region(&ihs, None, None, None).unwrap();
        for (got, want) in back.samples::<f32>().unwrap().iter().zip(xyz.samples::<f32>().unwrap()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_region_parameters_checked() {
        let cs = IhsColorSpace::new();
        let one = PixelRegion::zeroed(Rect::from_size(2, 2), 1, SampleType::Byte);
        assert!(cs.from_rgb_region(&one, None, None, None).unwrap_err().is_invalid_argument());
        let src = PixelRegion::zeroed(Rect::from_size(2, 2), 3, SampleType::Byte);
        assert!(cs.to_rgb_region(&src, Some(&[8, 8, 8, 8]), None, None).is_err());
    }
}

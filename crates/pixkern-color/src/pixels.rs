//! Gathering and storing 3-band pixels for the region transforms.

use pixkern_core::{dispatch_sample, Error, PixelRegion, Result, Sample};

/// Largest code of a `bits`-wide component, `2^bits - 1`.
#[inline]
pub(crate) fn max_code(bits: u32) -> f64 {
    (u64::MAX >> (64 - bits)) as f64
}

/// Reads every pixel of a 3-band region as unsigned codes (floats as stored),
/// row-major.
pub(crate) fn read_codes(region: &PixelRegion) -> Result<Vec<[f64; 3]>> {
    dispatch_sample!(region.sample_type(), T => read_typed::<T>(region))
}

fn read_typed<T: Sample>(region: &PixelRegion) -> Result<Vec<[f64; 3]>> {
    let data = region
        .samples::<T>()
        .ok_or_else(|| Error::unsupported_format(region.data().type_name()))?;
    let w = region.width() as usize;
    let h = region.height() as usize;
    let mut out = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            out.push([0, 1, 2].map(|b| data[region.index(b, x, y)].to_code()));
        }
    }
    Ok(out)
}

/// Stores row-major pixel values into a 3-band region.
///
/// Integral storage rounds to the nearest code and wraps it to the storage
/// width, so codes above the signed range land as negative values in `Short`
/// and `Int` regions. Float storage receives the values unrounded.
pub(crate) fn write_values(dest: &mut PixelRegion, values: &[[f64; 3]]) -> Result<()> {
    dispatch_sample!(dest.sample_type(), T => write_typed::<T>(dest, values))
}

fn write_typed<T: Sample>(dest: &mut PixelRegion, values: &[[f64; 3]]) -> Result<()> {
    let w = dest.width() as usize;
    let pixel_stride = dest.pixel_stride();
    let line_stride = dest.line_stride();
    let offsets = [0, 1, 2].map(|b| dest.band_offsets()[b]);
    let type_name = dest.data().type_name();
    let data = dest
        .samples_mut::<T>()
        .ok_or_else(|| Error::unsupported_format(type_name))?;

    for (p, v) in values.iter().enumerate() {
        let base = (p / w) * line_stride + (p % w) * pixel_stride;
        for b in 0..3 {
            data[offsets[b] + base] = store::<T>(v[b]);
        }
    }
    Ok(())
}

#[inline]
fn store<T: Sample>(v: f64) -> T {
    if T::IS_FLOAT {
        T::from_f64(v)
    } else {
        T::from_code((v + 0.5) as i64)
    }
}

//! Color transforms across storage types and color spaces.

use std::f32::consts::TAU;
use std::sync::Arc;

use approx::assert_relative_eq;
use pixkern_color::{
    ColorSpaceJai, IhsColorSpace, IhsTables, MAX_XYZ, ciexyz_to_rgb, rgb_to_ciexyz, srgb,
};
use pixkern_core::{PixelRegion, Rect, SampleType};

fn one_pixel<T: Copy>(values: [T; 3]) -> PixelRegion
where
    Vec<T>: Into<pixkern_core::SampleBuffer>,
{
    PixelRegion::interleaved(Rect::from_size(1, 1), 3, values.to_vec()).unwrap()
}

#[test]
fn test_shared_instance_white() {
    let ihs = IhsColorSpace::instance();
    assert_eq!(ihs.from_rgb([1.0, 1.0, 1.0]), vec![1.0, TAU, 0.0]);
    assert_eq!(ihs.to_rgb(&[1.0, TAU, 0.0]).unwrap(), [1.0, 1.0, 1.0]);
}

#[test]
fn test_color_space_as_trait_object() {
    let spaces: Vec<Arc<dyn ColorSpaceJai>> =
        vec![IhsColorSpace::instance(), Arc::new(IhsColorSpace::new())];
    for cs in &spaces {
        assert_eq!(cs.num_components(), 3);
        let ihs = cs.from_rgb([0.2, 0.5, 0.7]);
        let rgb = cs.to_rgb(&ihs).unwrap();
        for (got, want) in rgb.iter().zip([0.2, 0.5, 0.7]) {
            assert_relative_eq!(*got, want, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_xyz_round_trip_wide_integral_types() {
    // Tolerances in 8-bit sRGB codes.
    let rgb = [0.8f32, 0.6, 0.4];
    let src = one_pixel(rgb);

    for (ty, tolerance) in [
        (SampleType::UShort, 0.5),
        (SampleType::Short, 0.5),
        (SampleType::Int, 0.01),
    ] {
        let xyz = PixelRegion::zeroed(src.bounds(), 3, ty);
        let encoded = rgb_to_ciexyz(&src, None, Some(xyz), None).unwrap();
        let float = PixelRegion::zeroed(src.bounds(), 3, SampleType::Float);
        let decoded = ciexyz_to_rgb(&encoded, None, Some(float), None).unwrap();
        for (got, want) in decoded.samples::<f32>().unwrap().iter().zip(rgb) {
            assert!(
                (got - want).abs() * 255.0 <= tolerance,
                "{ty}: {got} vs {want}"
            );
        }
    }
}

#[test]
fn test_int_destination_uses_unsigned_codes() {
    let src = one_pixel([1.0f32, 1.0, 1.0]);
    let dest = PixelRegion::zeroed(src.bounds(), 3, SampleType::Int);
    let xyz = rgb_to_ciexyz(&src, None, Some(dest), None).unwrap();

    let norm = u32::MAX as f64 / MAX_XYZ as f64;
    let expected = srgb::rgb_to_xyz([1.0; 3]).map(|v| (v as f64 * norm + 0.5) as i64 as u32);
    let codes: Vec<u32> = xyz.samples::<i32>().unwrap().iter().map(|&v| v as u32).collect();
    assert_eq!(codes, expected);
    // X and Y exceed half the code range, so the stored i32 is negative.
    assert!(xyz.samples::<i32>().unwrap()[0] < 0);
}

#[test]
fn test_destination_component_sizes() {
    let src = one_pixel([1.0f32, 1.0, 1.0]);
    let dest = PixelRegion::zeroed(src.bounds(), 3, SampleType::UShort);
    let rgb = ciexyz_to_rgb(
        &rgb_to_ciexyz(&src, None, None, None).unwrap(),
        None,
        Some(dest),
        Some(&[10, 12, 16]),
    )
    .unwrap();
    let codes = rgb.samples::<u16>().unwrap();
    assert!((1022..=1023).contains(&codes[0]), "{codes:?}");
    assert!((4094..=4095).contains(&codes[1]), "{codes:?}");
    assert!(codes[2] >= 65530, "{codes:?}");
}

#[test]
fn test_ihs_through_ciexyz_into_short() {
    let cs = IhsColorSpace::new();
    let rgb = PixelRegion::interleaved(
        Rect::from_size(3, 1),
        3,
        vec![200u8, 40, 90, 10, 128, 250, 30, 200, 60],
    )
    .unwrap();
    let ihs = cs.from_rgb_region(&rgb, None, None, None).unwrap();

    let short = PixelRegion::zeroed(ihs.bounds(), 3, SampleType::Short);
    let xyz = cs.to_ciexyz_region(&ihs, None, Some(short), None).unwrap();
    assert_eq!(xyz.sample_type(), SampleType::Short);

    let float = PixelRegion::zeroed(ihs.bounds(), 3, SampleType::Float);
    let back = cs.from_ciexyz_region(&xyz, None, Some(float), None).unwrap();
    let direct = cs
        .from_rgb_region(&rgb, None, Some(PixelRegion::zeroed(rgb.bounds(), 3, SampleType::Float)), None)
        .unwrap();

    let back = back.samples::<f32>().unwrap();
    let direct = direct.samples::<f32>().unwrap();
    for p in 0..3 {
        // Intensity and saturation within a few byte codes, hue within a few degrees.
        assert!((back[3 * p] - direct[3 * p]).abs() < 0.02, "pixel {p}");
        assert!((back[3 * p + 1] - direct[3 * p + 1]).abs() < 0.1, "pixel {p}");
        assert!((back[3 * p + 2] - direct[3 * p + 2]).abs() < 0.03, "pixel {p}");
    }
}

#[test]
fn test_shared_tables_survive_eviction() {
    let tables = Arc::new(IhsTables::new());
    let a = IhsColorSpace::with_tables(Arc::clone(&tables));
    let b = IhsColorSpace::with_tables(Arc::clone(&tables));
    let src = one_pixel([200u8, 40, 90]);

    let first = a.from_rgb_region(&src, None, None, None).unwrap();
    assert_eq!(tables.built_count(), 2);

    tables.evict();
    assert_eq!(tables.built_count(), 0);

    let second = b.from_rgb_region(&src, None, None, None).unwrap();
    assert_eq!(first, second);
    assert_eq!(b.tables().built_count(), 2);
}

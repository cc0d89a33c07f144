//! Perspective mapping and table interpolation used together for resampling.

use approx::assert_relative_eq;
use pixkern_core::{PixelRegion, Rect};
use pixkern_math::{InterpolationTable, PerspectiveTransform};
use pixkern_stats::{Histogram, SampleGrid};

const QUAD: [[f64; 2]; 4] = [[2.0, 1.0], [9.0, 2.0], [8.0, 7.5], [1.5, 6.0]];

fn assert_point_eq(got: [f64; 2], want: [f64; 2]) {
    assert_relative_eq!(got[0], want[0], epsilon = 1e-9);
    assert_relative_eq!(got[1], want[1], epsilon = 1e-9);
}

#[test]
fn test_square_to_quad_maps_unit_corners() {
    let tx = PerspectiveTransform::square_to_quad(QUAD);
    let unit = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    for (corner, want) in unit.into_iter().zip(QUAD) {
        assert_point_eq(tx.transform_point(corner), want);
    }
}

#[test]
fn test_quad_to_same_quad_fixes_points() {
    let tx = PerspectiveTransform::quad_to_quad(QUAD, QUAD);
    for p in [[0.0, 0.0], [3.0, 4.0], [-2.5, 10.0]] {
        assert_point_eq(tx.transform_point(p), p);
    }
}

#[test]
fn test_inverse_composition_fixes_points() {
    let dst = [[0.0, 0.0], [4.0, 0.0], [3.5, 4.0], [0.5, 4.0]];
    let tx = PerspectiveTransform::quad_to_quad(QUAD, dst);
    let inverse = tx.create_inverse().unwrap();

    let mut round_trip = tx;
    round_trip.concatenate(&inverse);
    for p in [[1.0, 1.0], [5.0, 3.0], [2.0, 6.5]] {
        assert_point_eq(round_trip.transform_point(p), p);
        assert_point_eq(tx.inverse_transform_point(tx.transform_point(p)).unwrap(), p);
    }

    let src = [1.0f32, 1.0, 5.0, 3.0];
    let mut mapped = [0.0f64; 4];
    tx.transform_points(&src, &mut mapped).unwrap();
    let mut back = [0.0f32; 4];
    tx.inverse_transform_points(&mapped, &mut back).unwrap();
    for (a, b) in src.iter().zip(back) {
        assert_relative_eq!(*a, b, epsilon = 1e-5);
    }
}

#[test]
fn test_fixed_point_and_float_kernels_agree() {
    let samples = [[12, 200, 45, 90], [0, 255, 128, 64], [33, 77, 180, 20], [90, 5, 240, 111]];
    for table in [
        InterpolationTable::bilinear(8, 14).unwrap(),
        InterpolationTable::bicubic(8, 14, -0.5).unwrap(),
    ] {
        let rows_i: Vec<&[i32]> = samples.iter().map(|r| &r[..]).collect();
        let as_f64: Vec<Vec<f64>> = samples
            .iter()
            .map(|r| r.iter().map(|&v| f64::from(v)).collect())
            .collect();
        let rows_f: Vec<&[f64]> = as_f64.iter().map(Vec::as_slice).collect();

        for (px, py) in [(0usize, 0usize), (64, 200), (255, 17), (128, 128)] {
            let fixed = table.interpolate(&rows_i, px, py);
            let float = table.interpolate(&rows_f, px as f32 / 256.0, py as f32 / 256.0);
            assert!(
                (f64::from(fixed) - float).abs() <= 1.5,
                "phase ({px}, {py}): {fixed} vs {float}"
            );
        }
    }
}

#[test]
fn test_constant_region_survives_perspective_resample() {
    let src = PixelRegion::interleaved(Rect::from_size(8, 8), 1, vec![77u8; 64]).unwrap();
    let (width, height) = (4, 4);
    let dst_quad = [[0.0, 0.0], [4.0, 0.0], [3.5, 4.0], [0.5, 4.0]];
    let src_quad = [[2.0, 2.0], [5.0, 2.0], [5.0, 5.0], [2.0, 5.0]];
    let forward = PerspectiveTransform::quad_to_quad(src_quad, dst_quad);

    let sub_bits = 8;
    let table = InterpolationTable::bilinear(sub_bits, 12).unwrap();
    let samples = src.samples::<u8>().unwrap();
    let at = |x: usize, y: usize| i32::from(samples[src.index(0, x, y)]);

    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let [sx, sy] = forward
                .inverse_transform_point([x as f64 + 0.5, y as f64 + 0.5])
                .unwrap();
            let sx = sx.clamp(0.0, 6.999);
            let sy = sy.clamp(0.0, 6.999);
            let (ix, iy) = (sx.floor() as usize, sy.floor() as usize);
            let phase = |f: f64| ((f * (1u32 << sub_bits) as f64) as usize).min(255);
            let value = table.interpolate_2x2(
                [[at(ix, iy), at(ix + 1, iy)], [at(ix, iy + 1), at(ix + 1, iy + 1)]],
                phase(sx.fract()),
                phase(sy.fract()),
            );
            out.push(value as u8);
        }
    }

    let dst = PixelRegion::interleaved(Rect::from_size(width as u32, height as u32), 1, out).unwrap();
    let h = Histogram::uniform(256, 0.0, 256.0, 1).unwrap();
    h.count_pixels(&dst, None, SampleGrid::default()).unwrap();
    assert_eq!(h.band_bins(0)[77], 16);
    assert_relative_eq!(h.mean()[0], 77.0);
}

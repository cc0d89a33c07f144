//! Histogram counting and thresholds driven from regions and config files.

use std::io::Write;

use approx::assert_relative_eq;
use pixkern_core::{PixelRegion, Rect, RoiRects, SampleType};
use pixkern_stats::{Histogram, HistogramConfig, SampleGrid, ThresholdMethod};

/// Two grey levels on a checkerboard, every 8th pixel brightened.
fn two_level_region(width: u32, height: u32) -> PixelRegion {
    let data: Vec<u8> = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let base = if (x + y) % 2 == 0 { 60 } else { 180 };
            if i % 8 == 0 { base + 10 } else { base }
        })
        .collect();
    PixelRegion::interleaved(Rect::from_size(width, height), 1, data).unwrap()
}

#[test]
fn test_unit_bins_mean() {
    let region = PixelRegion::interleaved(Rect::from_size(4, 1), 1, vec![0u8, 1, 2, 3]).unwrap();
    let h = Histogram::new(&[4], &[0.0], &[4.0]).unwrap();
    h.count_pixels(&region, None, SampleGrid::default()).unwrap();

    assert_eq!(h.band_bins(0), vec![1, 1, 1, 1]);
    assert_eq!(h.totals(), &[4]);
    assert_relative_eq!(h.mean()[0], 1.5);
}

#[test]
fn test_counting_is_additive() {
    let region = two_level_region(16, 12);
    let once = Histogram::uniform(32, 0.0, 256.0, 1).unwrap();
    once.count_pixels(&region, None, SampleGrid::default()).unwrap();

    // Top and bottom halves counted separately add up to the whole.
    let split = Histogram::uniform(32, 0.0, 256.0, 1).unwrap();
    let top = RoiRects::new(vec![Rect::new(0, 0, 16, 6)]);
    let bottom = RoiRects::new(vec![Rect::new(0, 6, 16, 6)]);
    split.count_pixels(&region, Some(&top), SampleGrid::default()).unwrap();
    split.count_pixels(&region, Some(&bottom), SampleGrid::default()).unwrap();
    assert_eq!(split.bins(), once.bins());

    // A second full count doubles every bin.
    once.count_pixels(&region, None, SampleGrid::default()).unwrap();
    let doubled: Vec<u32> = split.band_bins(0).iter().map(|c| c * 2).collect();
    assert_eq!(once.band_bins(0), doubled);
}

#[test]
fn test_concurrent_counting_matches_serial() {
    let region = two_level_region(32, 32);
    let serial = Histogram::uniform(16, 0.0, 256.0, 1).unwrap();
    for _ in 0..4 {
        serial.count_pixels(&region, None, SampleGrid::default()).unwrap();
    }

    let shared = Histogram::uniform(16, 0.0, 256.0, 1).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| shared.count_pixels(&region, None, SampleGrid::default()).unwrap());
        }
    });
    assert_eq!(shared.bins(), serial.bins());
}

#[test]
fn test_clear_then_recount() {
    let region = two_level_region(10, 10);
    let mut h = Histogram::uniform(8, 0.0, 256.0, 1).unwrap();
    h.count_pixels(&region, None, SampleGrid::default()).unwrap();
    let first = h.bins();
    let first_mean = h.mean()[0];

    h.clear_histogram();
    assert!(h.band_bins(0).iter().all(|&c| c == 0));

    h.count_pixels(&region, None, SampleGrid::default()).unwrap();
    assert_eq!(h.bins(), first);
    h.reset_statistics();
    assert_relative_eq!(h.mean()[0], first_mean);
}

#[test]
fn test_totals_match_sampled_pixels() {
    let region = two_level_region(10, 9);
    let h = Histogram::uniform(4, 0.0, 256.0, 1).unwrap();
    h.count_pixels(&region, None, SampleGrid::new(0, 0, 2, 3)).unwrap();

    // ceil(10 / 2) columns by ceil(9 / 3) rows.
    assert_eq!(h.totals(), &[15]);
    let sum: u32 = h.band_bins(0).iter().sum();
    assert_eq!(u64::from(sum), h.totals()[0]);
    assert_eq!(h.sub_total(0, 0, 3).unwrap(), 15);
}

#[test]
fn test_every_storage_type_counts() {
    let bounds = Rect::from_size(3, 1);
    let regions = [
        PixelRegion::interleaved(bounds, 1, vec![1u8, 2, 3]).unwrap(),
        PixelRegion::interleaved(bounds, 1, vec![1u16, 2, 3]).unwrap(),
        PixelRegion::interleaved(bounds, 1, vec![1i16, 2, 3]).unwrap(),
        PixelRegion::interleaved(bounds, 1, vec![1i32, 2, 3]).unwrap(),
        PixelRegion::interleaved(bounds, 1, vec![1.0f32, 2.0, 3.0]).unwrap(),
        PixelRegion::interleaved(bounds, 1, vec![1.0f64, 2.0, 3.0]).unwrap(),
        PixelRegion::bits(bounds, 1, vec![1, 1, 1]).unwrap(),
    ];
    for region in &regions {
        let h = Histogram::uniform(4, 0.0, 4.0, 1).unwrap();
        h.count_pixels(region, None, SampleGrid::default()).unwrap();
        let expected = if region.sample_type() == SampleType::Bit {
            vec![0, 3, 0, 0]
        } else {
            vec![0, 1, 1, 1]
        };
        assert_eq!(h.band_bins(0), expected, "{}", region.sample_type());
    }
}

#[test]
fn test_signed_short_bins_negative_values() {
    let data = vec![-100i16, -1, 0, 99];
    let region = PixelRegion::interleaved(Rect::from_size(4, 1), 1, data).unwrap();
    let h = Histogram::uniform(2, -100.0, 100.0, 1).unwrap();
    h.count_pixels(&region, None, SampleGrid::default()).unwrap();
    assert_eq!(h.band_bins(0), vec![2, 2]);
}

fn bimodal(low: f64, high: f64) -> Histogram {
    // Two bumps rendered into a region so the counts go through count_pixels.
    let counts = [0u32, 2, 8, 20, 8, 2, 0, 0, 0, 0, 2, 8, 20, 8, 2, 0];
    let bw = (high - low) / 16.0;
    let data: Vec<f64> = counts
        .iter()
        .enumerate()
        .flat_map(|(b, &c)| std::iter::repeat_n(low + (b as f64 + 0.25) * bw, c as usize))
        .collect();
    let n = data.len() as u32;
    let region = PixelRegion::interleaved(Rect::from_size(n, 1), 1, data).unwrap();
    let h = Histogram::uniform(16, low, high, 1).unwrap();
    h.count_pixels(&region, None, SampleGrid::default()).unwrap();
    assert_eq!(h.band_bins(0), counts.to_vec());
    h
}

#[test]
fn test_thresholds_follow_level_offset() {
    let base = bimodal(0.0, 16.0);
    let shifted = bimodal(100.0, 116.0);

    for method in [
        ThresholdMethod::PTile { p: 0.4 },
        ThresholdMethod::Iterative,
        ThresholdMethod::MaxVariance,
        ThresholdMethod::MaxEntropy,
        ThresholdMethod::MinError,
        ThresholdMethod::MinFuzziness,
    ] {
        let t0 = base.threshold(method).unwrap()[0];
        let t1 = shifted.threshold(method).unwrap()[0];
        assert_relative_eq!(t1 - t0, 100.0, epsilon = 1e-6);
        assert!(t0 > 3.0 && t0 < 13.0, "{} -> {t0}", method.name());
    }

    // Mode reports a bin index, unaffected by the level range.
    let mode = ThresholdMethod::Mode { power: 2.0 };
    assert_eq!(base.threshold(mode).unwrap(), shifted.threshold(mode).unwrap());
}

#[test]
fn test_thresholds_follow_level_scale() {
    let base = bimodal(0.0, 16.0);
    let scaled = bimodal(0.0, 64.0);
    for method in [
        ThresholdMethod::PTile { p: 0.6 },
        ThresholdMethod::Iterative,
        ThresholdMethod::MaxEntropy,
        ThresholdMethod::MinFuzziness,
    ] {
        let t0 = base.threshold(method).unwrap()[0];
        let t1 = scaled.threshold(method).unwrap()[0];
        assert_relative_eq!(t1, 4.0 * t0, epsilon = 1e-4);
    }
}

#[test]
fn test_config_file_drives_histogram() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "num_bins: [16]\nlow_value: [0.0]\nhigh_value: [256.0]\ngrid:\n  x_period: 1\nthreshold:\n  method: iterative\n"
    )
    .unwrap();

    let config = HistogramConfig::from_path(file.path()).unwrap();
    let region = two_level_region(8, 8);
    let h = config.build(region.num_bands()).unwrap();
    h.count_pixels(&region, None, config.grid).unwrap();

    let t = config.thresholds(&h).unwrap().unwrap();
    assert!(t[0] > 60.0 && t[0] < 180.0, "threshold {}", t[0]);
}

#[test]
fn test_multiband_config_pads_first_entry() {
    let config = HistogramConfig::from_yaml_str("num_bins: [4]\nhigh_value: [4.0]").unwrap();
    let data = vec![0u8, 3, 1, 2, 2, 1, 3, 0];
    let region = PixelRegion::interleaved(Rect::from_size(4, 1), 2, data).unwrap();
    let h = config.build(2).unwrap();
    h.count_pixels(&region, None, config.grid).unwrap();
    assert_eq!(h.band_bins(0), vec![1, 1, 1, 1]);
    assert_eq!(h.band_bins(1), vec![1, 1, 1, 1]);
}

//! # pixkern-stats
//!
//! Histogram accumulation and threshold selection for pixel regions.
//!
//! # Overview
//!
//! - [`Histogram`] - per-band bins with thread-safe additive counting
//! - [`SampleGrid`] - the sampling lattice for [`Histogram::count_pixels`]
//! - [`ThresholdMethod`] - p-tile, mode, isodata, Otsu-style variance,
//!   entropy, minimum-error and minimum-fuzziness selection
//! - [`HistogramConfig`] - YAML-loadable operator configuration
//!
//! # Usage
//!
//! ```rust
//! use pixkern_core::{PixelRegion, Rect};
//! use pixkern_stats::{Histogram, SampleGrid, ThresholdMethod};
//!
//! let data: Vec<u8> = (0..64).map(|i| if i % 2 == 0 { 40 } else { 200 }).collect();
//! let region = PixelRegion::interleaved(Rect::from_size(8, 8), 1, data)?;
//!
//! let hist = Histogram::uniform(256, 0.0, 256.0, 1)?;
//! hist.count_pixels(&region, None, SampleGrid::default())?;
//!
//! let t = hist.threshold(ThresholdMethod::Iterative)?;
//! assert!(t[0] > 40.0 && t[0] < 200.0);
//! # Ok::<(), pixkern_core::Error>(())
//! ```
//!
//! # Dependencies
//!
//! - [`pixkern_core`] - regions, ROI and the shared error type
//! - `rayon` - per-band counting (feature `parallel`)
//! - [`serde`], [`serde_yaml`] - configuration
//! - [`tracing`] - operation diagnostics
//!
//! # Feature Flags
//!
//! - `parallel` (default) - count bands on the rayon pool

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod histogram;

pub use config::{ConfigError, ConfigResult, HistogramConfig};
pub use histogram::{Histogram, SampleGrid, ThresholdMethod};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::HistogramConfig;
    pub use crate::histogram::{Histogram, SampleGrid, ThresholdMethod};
}

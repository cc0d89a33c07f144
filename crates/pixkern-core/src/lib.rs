//! # pixkern-core
//!
//! Core types shared by the pixkern numeric kernels.
//!
//! This crate provides the vocabulary every kernel speaks:
//!
//! - [`SampleType`], [`Sample`], [`SampleBuffer`] - the six storage formats
//!   and the typed access capability generic kernels are written against
//! - [`PixelRegion`] - a strided multi-band window over a sample buffer
//! - [`Rect`] - integer rectangles with a signed origin
//! - [`Roi`], [`RoiRects`], [`RoiMask`] - region-of-interest decomposition
//! - [`Error`], [`Result`] - the shared error taxonomy
//!
//! ## Crate Structure
//!
//! ```text
//! pixkern-core (this crate)
//!    ^
//!    |
//!    +-- pixkern-math  (perspective transforms, interpolation tables)
//!    +-- pixkern-stats (histograms, thresholds)
//!    +-- pixkern-color (CIEXYZ/sRGB transforms, IHS)
//! ```
//!
//! ## Generic kernels
//!
//! Algorithms are written once, generic over [`Sample`], and instantiated
//! per storage type through [`dispatch_sample!`]:
//!
//! ```rust
//! use pixkern_core::{dispatch_sample, PixelRegion, Rect, Sample};
//!
//! fn band_sum<T: Sample>(region: &PixelRegion) -> f64 {
//!     let data = region.samples::<T>().unwrap_or(&[]);
//!     let mut sum = 0.0;
//!     for y in 0..region.height() as usize {
//!         for x in 0..region.width() as usize {
//!             sum += data[region.index(0, x, y)].to_f64();
//!         }
//!     }
//!     sum
//! }
//!
//! let region = PixelRegion::interleaved(Rect::from_size(3, 1), 1, vec![1i16, -2, 3]).unwrap();
//! let sum = dispatch_sample!(region.sample_type(), T => band_sum::<T>(&region));
//! assert_eq!(sum, 2.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Serialize/Deserialize for [`Rect`] and [`SampleType`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod format;
pub mod rect;
pub mod region;
pub mod roi;

pub use error::{Error, Result};
pub use format::{Sample, SampleBuffer, SampleType};
pub use rect::Rect;
pub use region::PixelRegion;
pub use roi::{Roi, RoiMask, RoiRects};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use pixkern_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::format::{Sample, SampleBuffer, SampleType};
    pub use crate::rect::Rect;
    pub use crate::region::PixelRegion;
    pub use crate::roi::{Roi, RoiMask, RoiRects};
}

//! # pixkern-color
//!
//! Pixel-region color transforms between device color spaces and the
//! CIEXYZ / sRGB connection spaces.
//!
//! # Overview
//!
//! - [`ColorSpaceJai`] - the device color space contract, for single colors
//!   and whole [`PixelRegion`](pixkern_core::PixelRegion)s
//! - [`ciexyz_to_rgb`], [`rgb_to_ciexyz`] - the fixed D50 CIEXYZ <-> sRGB
//!   region transforms, over every integral and float storage type
//! - [`IhsColorSpace`] - intensity, hue, saturation
//! - [`IhsTables`] - get-or-build cache of the 8-bit IHS lookup tables
//! - [`srgb`] - the sRGB curve and matrices
//!
//! # Usage
//!
//! ```rust
//! use pixkern_color::{ColorSpaceJai, IhsColorSpace};
//! use pixkern_core::{PixelRegion, Rect};
//!
//! let rgb = PixelRegion::interleaved(Rect::from_size(2, 1), 3, vec![255u8, 0, 0, 90, 90, 90])?;
//! let ihs = IhsColorSpace::new().from_rgb_region(&rgb, None, None, None)?;
//!
//! // Red: intensity 85, hue 0, full saturation. Grey: hue at the full turn.
//! assert_eq!(ihs.samples::<u8>(), Some(&[85, 0, 255, 90, 255, 0][..]));
//! # Ok::<(), pixkern_core::Error>(())
//! ```
//!
//! # Dependencies
//!
//! - [`pixkern_core`] - regions, sample access and the shared error type
//! - [`tracing`] - conversion diagnostics

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod ihs;
pub mod jai;
mod pixels;
pub mod srgb;
pub mod tables;

pub use ihs::{IhsColorSpace, ciexyz_to_ihs, ihs_to_ciexyz, ihs_to_rgb, rgb_to_ihs};
pub use jai::{ColorSpaceJai, ColorSpaceType, check_parameters, ciexyz_to_rgb, rgb_to_ciexyz};
pub use srgb::MAX_XYZ;
pub use tables::IhsTables;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::ihs::IhsColorSpace;
    pub use crate::jai::{ColorSpaceJai, ColorSpaceType, ciexyz_to_rgb, rgb_to_ciexyz};
    pub use crate::tables::IhsTables;
}

//! # pixkern-math
//!
//! Coordinate and kernel math used by resampling operators.
//!
//! - [`PerspectiveTransform`] - 3x3 homogeneous 2D transforms with adjoint,
//!   inverse, composition and four-point solving
//! - [`AffineTransform`] - 2x3 affine transforms, composable with perspective ones
//! - [`InterpolationTable`] - precomputed separable polyphase kernels in
//!   fixed-point, `f32` and `f64` form
//!
//! Both components are pure numeric utilities. A resampling loop calls
//! them once per output pixel; tables are immutable after construction and
//! can be shared across threads.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_math::{InterpolationTable, PerspectiveTransform};
//!
//! let src = [[0.0, 0.0], [64.0, 0.0], [64.0, 64.0], [0.0, 64.0]];
//! let dst = [[4.0, 2.0], [60.0, 8.0], [62.0, 58.0], [2.0, 60.0]];
//! let dst_to_src = PerspectiveTransform::quad_to_quad(dst, src);
//!
//! let [sx, sy] = dst_to_src.transform_point([30.0, 30.0]);
//! let table = InterpolationTable::bicubic(5, 14, -0.5).unwrap();
//! let xfrac = (sx.fract() * table.num_subsamples_h() as f64) as usize;
//! let yfrac = (sy.fract() * table.num_subsamples_v() as f64) as usize;
//! let patch = [[100i32; 4]; 4];
//! let v = table.interpolate_4x4(patch, xfrac, yfrac);
//! assert!((v - 100).abs() <= 1);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - `DMat3` interop for perspective matrices
//! - [`pixkern_core`] - shared error type
//! - [`tracing`] - construction and degeneracy diagnostics
//!
//! # Feature Flags
//!
//! - `serde` - Serialize/Deserialize for the transform types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod affine;
mod interp_table;
mod perspective;

pub use affine::AffineTransform;
pub use interp_table::{InterpolationTable, KernelData, TableLayout, TapSample};
pub use perspective::{Coord, PerspectiveTransform, PERSPECTIVE_DIVIDE_EPSILON};

/// Re-export glam matrix types used at the API boundary.
pub mod glam {
    pub use ::glam::{DMat3, DVec3};
}

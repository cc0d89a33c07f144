//! Error types shared by all pixkern kernels.
//!
//! # Overview
//!
//! The [`Error`] enum mirrors the three failure classes of the kernel set:
//! - Invalid arguments (bad lengths, empty ranges, band mismatches)
//! - Unsupported sample formats
//! - Numerical degeneracy (singular transforms)
//!
//! All failures are reported synchronously at the point of detection.
//! Arguments are validated before any state is touched, so a failed call
//! never leaves partial results behind.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_core::{Error, Result};
//!
//! fn check_bins(num_bins: usize) -> Result<()> {
//!     if num_bins == 0 {
//!         return Err(Error::invalid_argument("number of bins must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_bins(0).unwrap_err().is_invalid_argument());
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - derive macro for [`std::error::Error`]
//!
//! # Used By
//!
//! - `pixkern-stats` - histogram validation
//! - `pixkern-color` - color transform parameter checks
//! - `pixkern-math` - non-invertible transforms, table lengths

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by pixel kernels.
///
/// # Categories
///
/// - **Argument errors**: [`InvalidArgument`](Error::InvalidArgument),
///   [`BandMismatch`](Error::BandMismatch), [`IndexOutOfRange`](Error::IndexOutOfRange),
///   [`InvalidRegion`](Error::InvalidRegion)
/// - **Format errors**: [`UnsupportedFormat`](Error::UnsupportedFormat)
/// - **Numerical errors**: [`NonInvertible`](Error::NonInvertible)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A parameter failed validation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pixkern_core::Error;
    ///
    /// let err = Error::invalid_argument("low value must be less than high value");
    /// assert!(err.to_string().contains("low value"));
    /// ```
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument
        reason: String,
    },

    /// Band count of a region differs from what the operation requires.
    #[error("band mismatch: expected {expected}, got {got}")]
    BandMismatch {
        /// Required band count
        expected: usize,
        /// Band count found
        got: usize,
    },

    /// An index lies outside the valid range `[0, len)`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// Offending index
        index: usize,
        /// Length of the indexed range
        len: usize,
    },

    /// A sample buffer is too short for the declared region geometry.
    #[error("sample buffer of length {len} too short for band {band} (needs {required})")]
    InvalidRegion {
        /// Band whose extent overruns the buffer
        band: usize,
        /// Minimum buffer length for that band
        required: usize,
        /// Actual buffer length
        len: usize,
    },

    /// The sample storage format has no numeric path for this operation.
    #[error("unsupported sample format: {format}")]
    UnsupportedFormat {
        /// Format name
        format: String,
    },

    /// A transform is singular or a homogeneous divisor vanished.
    #[error("non-invertible transform: {reason}")]
    NonInvertible {
        /// Description of the degeneracy
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error::InvalidArgument`] error.
    #[inline]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::BandMismatch`] error.
    #[inline]
    pub fn band_mismatch(expected: usize, got: usize) -> Self {
        Self::BandMismatch { expected, got }
    }

    /// Creates an [`Error::IndexOutOfRange`] error.
    #[inline]
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Creates an [`Error::InvalidRegion`] error.
    #[inline]
    pub fn invalid_region(band: usize, required: usize, len: usize) -> Self {
        Self::InvalidRegion {
            band,
            required,
            len,
        }
    }

    /// Creates an [`Error::UnsupportedFormat`] error.
    #[inline]
    pub fn unsupported_format(format: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            format: format.into(),
        }
    }

    /// Creates an [`Error::NonInvertible`] error.
    #[inline]
    pub fn non_invertible(reason: impl Into<String>) -> Self {
        Self::NonInvertible {
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by call shape rather than data.
    #[inline]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. }
                | Self::BandMismatch { .. }
                | Self::IndexOutOfRange { .. }
                | Self::InvalidRegion { .. }
        )
    }

    /// Returns `true` if this is a numerical degeneracy.
    #[inline]
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::NonInvertible { .. })
    }

    /// Returns `true` if this is a format error.
    #[inline]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument() {
        let err = Error::invalid_argument("bins must be positive");
        assert!(err.to_string().contains("bins must be positive"));
        assert!(err.is_invalid_argument());
        assert!(!err.is_numerical());
    }

    #[test]
    fn test_band_mismatch() {
        let err = Error::band_mismatch(3, 4);
        let msg = err.to_string();
        assert!(msg.contains('3'));
        assert!(msg.contains('4'));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_non_invertible_is_distinct() {
        let err = Error::non_invertible("determinant is zero");
        assert!(err.is_numerical());
        assert!(!err.is_invalid_argument());
        assert!(!err.is_format_error());
    }

    #[test]
    fn test_region_message() {
        let err = Error::invalid_region(2, 100, 64);
        let msg = err.to_string();
        assert!(msg.contains("100"));
        assert!(msg.contains("64"));
    }
}

//! Sample storage formats and typed access to sample buffers.
//!
//! # Overview
//!
//! Pixel data reaches the kernels in one of seven storage types:
//!
//! | [`SampleType`] | Rust storage | Bits | Value read by statistics |
//! |----------------|--------------|------|--------------------------|
//! | `Bit`          | `u8` (0/1)   | 1    | unsigned                 |
//! | `Byte`         | `u8`         | 8    | unsigned                 |
//! | `UShort`       | `u16`        | 16   | unsigned                 |
//! | `Short`        | `i16`        | 16   | signed                   |
//! | `Int`          | `i32`        | 32   | unsigned (masked)        |
//! | `Float`        | `f32`        | 32   | as stored                |
//! | `Double`       | `f64`        | 64   | as stored                |
//!
//! The [`Sample`] trait is the single access capability the generic
//! kernels are written against. It exposes three views of a stored value:
//!
//! - [`Sample::to_f64`] - the numeric value histograms bin
//! - [`Sample::to_code`] - the unsigned digital code colour transforms normalize
//! - [`Sample::from_code`] - store an unsigned code, reinterpreting it as
//!   two's complement for signed storage
//!
//! The `from_code` reinterpretation matters: a 16-bit code of 40000 written
//! into `i16` storage must land as `-25536`, never clamp to `i16::MAX`.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_core::{Sample, SampleType};
//!
//! assert_eq!(<i16 as Sample>::from_code(40000), -25536i16);
//! assert_eq!((-25536i16).to_code(), 40000.0);
//! assert_eq!((-1i32).to_f64(), 4294967295.0);
//! assert_eq!(SampleType::UShort.bits(), 16);
//! ```

use std::fmt;

/// Storage type tag of a pixel region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleType {
    /// Unpacked 1-bit samples stored one per `u8`.
    Bit,
    /// 8-bit unsigned.
    #[default]
    Byte,
    /// 16-bit unsigned.
    UShort,
    /// 16-bit signed.
    Short,
    /// 32-bit integer, read as unsigned.
    Int,
    /// 32-bit IEEE float.
    Float,
    /// 64-bit IEEE float.
    Double,
}

impl SampleType {
    /// All storage types.
    pub const ALL: [SampleType; 7] = [
        Self::Bit,
        Self::Byte,
        Self::UShort,
        Self::Short,
        Self::Int,
        Self::Float,
        Self::Double,
    ];

    /// Bits per sample.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Bit => 1,
            Self::Byte => 8,
            Self::UShort | Self::Short => 16,
            Self::Int | Self::Float => 32,
            Self::Double => 64,
        }
    }

    /// Whether samples are IEEE floats.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Whether samples are integral digital codes.
    #[inline]
    pub const fn is_integral(&self) -> bool {
        !self.is_float()
    }

    /// Short lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bit => "bit",
            Self::Byte => "byte",
            Self::UShort => "ushort",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Typed access to one stored sample.
///
/// Sealed: implemented for exactly the six Rust storage types behind
/// [`SampleType`].
pub trait Sample: Copy + Default + PartialOrd + Send + Sync + 'static + sealed::Sealed {
    /// Storage type tag (`Byte` for `u8`; `Bit` regions share `u8` storage).
    const TYPE: SampleType;

    /// Storage width in bits.
    const STORAGE_BITS: u32;

    /// Whether the storage is an IEEE float.
    const IS_FLOAT: bool;

    /// Numeric value for statistics.
    ///
    /// Unsigned types and `i32` read as unsigned, `i16` reads as signed,
    /// floats as stored.
    fn to_f64(self) -> f64;

    /// Unsigned digital code used by colour normalization.
    ///
    /// Signed integral storage is reinterpreted as unsigned of the same width.
    /// Floats return their value.
    fn to_code(self) -> f64;

    /// Stores an unsigned code, wrapping to the storage width.
    ///
    /// Float storage receives the code as a value.
    fn from_code(code: i64) -> Self;

    /// Stores a value by plain cast (truncating for integral storage).
    fn from_f64(v: f64) -> Self;

    /// Borrows the typed slice if `buf` holds this storage type.
    fn slice(buf: &SampleBuffer) -> Option<&[Self]>;

    /// Mutably borrows the typed slice if `buf` holds this storage type.
    fn slice_mut(buf: &mut SampleBuffer) -> Option<&mut [Self]>;
}

macro_rules! impl_integral_sample {
    ($t:ty, $unsigned:ty, $variant:ident, $tag:ident, $bits:expr, $stat:expr) => {
        impl Sample for $t {
            const TYPE: SampleType = SampleType::$tag;
            const STORAGE_BITS: u32 = $bits;
            const IS_FLOAT: bool = false;

            #[inline]
            fn to_f64(self) -> f64 {
                let f: fn($t) -> f64 = $stat;
                f(self)
            }

            #[inline]
            fn to_code(self) -> f64 {
                (self as $unsigned) as f64
            }

            #[inline]
            fn from_code(code: i64) -> Self {
                code as $unsigned as $t
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                Self::from_code(v as i64)
            }

            #[inline]
            fn slice(buf: &SampleBuffer) -> Option<&[Self]> {
                match buf {
                    SampleBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[inline]
            fn slice_mut(buf: &mut SampleBuffer) -> Option<&mut [Self]> {
                match buf {
                    SampleBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_integral_sample!(u8, u8, Byte, Byte, 8, |v| v as f64);
impl_integral_sample!(u16, u16, UShort, UShort, 16, |v| v as f64);
impl_integral_sample!(i16, u16, Short, Short, 16, |v| v as f64);
impl_integral_sample!(i32, u32, Int, Int, 32, |v| (v as u32) as f64);

macro_rules! impl_float_sample {
    ($t:ty, $variant:ident, $bits:expr) => {
        impl Sample for $t {
            const TYPE: SampleType = SampleType::$variant;
            const STORAGE_BITS: u32 = $bits;
            const IS_FLOAT: bool = true;

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_code(self) -> f64 {
                self as f64
            }

            #[inline]
            fn from_code(code: i64) -> Self {
                code as $t
            }

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }

            #[inline]
            fn slice(buf: &SampleBuffer) -> Option<&[Self]> {
                match buf {
                    SampleBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[inline]
            fn slice_mut(buf: &mut SampleBuffer) -> Option<&mut [Self]> {
                match buf {
                    SampleBuffer::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_float_sample!(f32, Float, 32);
impl_float_sample!(f64, Double, 64);

/// Owned flat sample storage shared by all bands of a region.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer {
    /// `u8` storage (bit and byte regions).
    Byte(Vec<u8>),
    /// `u16` storage.
    UShort(Vec<u16>),
    /// `i16` storage.
    Short(Vec<i16>),
    /// `i32` storage.
    Int(Vec<i32>),
    /// `f32` storage.
    Float(Vec<f32>),
    /// `f64` storage.
    Double(Vec<f64>),
}

impl SampleBuffer {
    /// Allocates `len` zero samples for the given storage type.
    pub fn zeroed(ty: SampleType, len: usize) -> Self {
        match ty {
            SampleType::Bit | SampleType::Byte => Self::Byte(vec![0; len]),
            SampleType::UShort => Self::UShort(vec![0; len]),
            SampleType::Short => Self::Short(vec![0; len]),
            SampleType::Int => Self::Int(vec![0; len]),
            SampleType::Float => Self::Float(vec![0.0; len]),
            SampleType::Double => Self::Double(vec![0.0; len]),
        }
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::UShort(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    /// Returns `true` if no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if this storage can back a region of type `ty`.
    pub fn holds(&self, ty: SampleType) -> bool {
        matches!(
            (self, ty),
            (Self::Byte(_), SampleType::Bit | SampleType::Byte)
                | (Self::UShort(_), SampleType::UShort)
                | (Self::Short(_), SampleType::Short)
                | (Self::Int(_), SampleType::Int)
                | (Self::Float(_), SampleType::Float)
                | (Self::Double(_), SampleType::Double)
        )
    }

    /// Name of the storage variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Byte(_) => "byte",
            Self::UShort(_) => "ushort",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
        }
    }
}

macro_rules! impl_buffer_from {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for SampleBuffer {
            fn from(v: Vec<$t>) -> Self {
                Self::$variant(v)
            }
        }
    };
}

impl_buffer_from!(u8, Byte);
impl_buffer_from!(u16, UShort);
impl_buffer_from!(i16, Short);
impl_buffer_from!(i32, Int);
impl_buffer_from!(f32, Float);
impl_buffer_from!(f64, Double);

/// Runs `$body` with `$T` bound to the Rust storage type of a [`SampleType`].
///
/// `Bit` and `Byte` both bind `u8`.
///
/// ```rust
/// use pixkern_core::{dispatch_sample, Sample, SampleType};
///
/// fn storage_bits(ty: SampleType) -> u32 {
///     dispatch_sample!(ty, T => <T as Sample>::STORAGE_BITS)
/// }
///
/// assert_eq!(storage_bits(SampleType::Short), 16);
/// assert_eq!(storage_bits(SampleType::Bit), 8);
/// ```
#[macro_export]
macro_rules! dispatch_sample {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            $crate::SampleType::Bit | $crate::SampleType::Byte => {
                type $T = u8;
                $body
            }
            $crate::SampleType::UShort => {
                type $T = u16;
                $body
            }
            $crate::SampleType::Short => {
                type $T = i16;
                $body
            }
            $crate::SampleType::Int => {
                type $T = i32;
                $body
            }
            $crate::SampleType::Float => {
                type $T = f32;
                $body
            }
            $crate::SampleType::Double => {
                type $T = f64;
                $body
            }
        }
    };
}

//! Strided multi-band pixel regions.
//!
//! A [`PixelRegion`] is a rectangular window over a flat [`SampleBuffer`].
//! Sample `(band, x, y)` of the window lives at
//!
//! ```text
//! band_offsets[band] + y * line_stride + x * pixel_stride
//! ```
//!
//! with `x`, `y` relative to the region origin. This one layout describes
//! both pixel-interleaved and band-sequential storage.
//!
//! # Usage
//!
//! ```rust
//! use pixkern_core::{PixelRegion, Rect};
//!
//! // 2x1 RGB, interleaved
//! let region = PixelRegion::interleaved(
//!     Rect::from_size(2, 1),
//!     3,
//!     vec![10u8, 20, 30, 40, 50, 60],
//! ).unwrap();
//! assert_eq!(region.sample(2, 1, 0), 60.0);
//!
//! // Same pixels, band-sequential
//! let planar = PixelRegion::banded(
//!     Rect::from_size(2, 1),
//!     3,
//!     vec![10u8, 40, 20, 50, 30, 60],
//! ).unwrap();
//! assert_eq!(planar.sample(2, 1, 0), 60.0);
//! ```

use crate::error::{Error, Result};
use crate::format::{Sample, SampleBuffer, SampleType};
use crate::rect::Rect;

/// Rectangular window into strided multi-band sample storage.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelRegion {
    bounds: Rect,
    sample_type: SampleType,
    pixel_stride: usize,
    line_stride: usize,
    band_offsets: Vec<usize>,
    data: SampleBuffer,
}

impl PixelRegion {
    /// Creates a region over existing storage.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `band_offsets` is empty or `data`
    ///   cannot hold `sample_type`
    /// - [`Error::InvalidRegion`] if a band's last sample lies past the end
    ///   of `data`
    pub fn new(
        bounds: Rect,
        sample_type: SampleType,
        pixel_stride: usize,
        line_stride: usize,
        band_offsets: Vec<usize>,
        data: SampleBuffer,
    ) -> Result<Self> {
        if band_offsets.is_empty() {
            return Err(Error::invalid_argument("region must have at least one band"));
        }
        if !data.holds(sample_type) {
            return Err(Error::invalid_argument(format!(
                "{} storage cannot back a {} region",
                data.type_name(),
                sample_type
            )));
        }
        if !bounds.is_empty() {
            let w = bounds.width as usize;
            let h = bounds.height as usize;
            let extent = (h - 1) * line_stride + (w - 1) * pixel_stride + 1;
            for (band, &offset) in band_offsets.iter().enumerate() {
                let required = offset + extent;
                if data.len() < required {
                    return Err(Error::invalid_region(band, required, data.len()));
                }
            }
        }

        Ok(Self {
            bounds,
            sample_type,
            pixel_stride,
            line_stride,
            band_offsets,
            data,
        })
    }

    /// Creates a pixel-interleaved region with tightly packed rows.
    ///
    /// The sample type follows the storage variant (`Vec<u8>` gives `Byte`).
    pub fn interleaved(
        bounds: Rect,
        num_bands: usize,
        data: impl Into<SampleBuffer>,
    ) -> Result<Self> {
        let data = data.into();
        let ty = storage_type(&data);
        Self::new(
            bounds,
            ty,
            num_bands,
            bounds.width as usize * num_bands,
            (0..num_bands).collect(),
            data,
        )
    }

    /// Creates a band-sequential region: each band is a full plane.
    pub fn banded(bounds: Rect, num_bands: usize, data: impl Into<SampleBuffer>) -> Result<Self> {
        let data = data.into();
        let ty = storage_type(&data);
        let plane = bounds.area() as usize;
        Self::new(
            bounds,
            ty,
            1,
            bounds.width as usize,
            (0..num_bands).map(|b| b * plane).collect(),
            data,
        )
    }

    /// Creates an interleaved 1-bit region from unpacked `0`/`1` bytes.
    pub fn bits(bounds: Rect, num_bands: usize, data: Vec<u8>) -> Result<Self> {
        Self::new(
            bounds,
            SampleType::Bit,
            num_bands,
            bounds.width as usize * num_bands,
            (0..num_bands).collect(),
            SampleBuffer::Byte(data),
        )
    }

    /// Allocates a zero-filled interleaved region.
    pub fn zeroed(bounds: Rect, num_bands: usize, sample_type: SampleType) -> Self {
        let len = bounds.area() as usize * num_bands;
        Self {
            bounds,
            sample_type,
            pixel_stride: num_bands,
            line_stride: bounds.width as usize * num_bands,
            band_offsets: (0..num_bands).collect(),
            data: SampleBuffer::zeroed(sample_type, len),
        }
    }

    /// Region bounds in raster coordinates.
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.bounds.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.bounds.height
    }

    /// Storage type tag.
    #[inline]
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Number of bands.
    #[inline]
    pub fn num_bands(&self) -> usize {
        self.band_offsets.len()
    }

    /// Distance between horizontally adjacent samples of one band.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.pixel_stride
    }

    /// Distance between vertically adjacent samples of one band.
    #[inline]
    pub fn line_stride(&self) -> usize {
        self.line_stride
    }

    /// Offset of each band's first sample.
    #[inline]
    pub fn band_offsets(&self) -> &[usize] {
        &self.band_offsets
    }

    /// Flat storage.
    #[inline]
    pub fn data(&self) -> &SampleBuffer {
        &self.data
    }

    /// Mutable flat storage. The layout itself cannot be changed.
    #[inline]
    pub fn data_mut(&mut self) -> &mut SampleBuffer {
        &mut self.data
    }

    /// Consumes the region, returning its storage.
    pub fn into_data(self) -> SampleBuffer {
        self.data
    }

    /// Typed view of the storage, `None` if `T` is not the storage type.
    #[inline]
    pub fn samples<T: Sample>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Typed mutable view of the storage.
    #[inline]
    pub fn samples_mut<T: Sample>(&mut self) -> Option<&mut [T]> {
        T::slice_mut(&mut self.data)
    }

    /// Flat index of sample `(band, x, y)`, coordinates relative to the origin.
    ///
    /// # Panics
    ///
    /// Panics if `band >= num_bands()`.
    #[inline]
    pub fn index(&self, band: usize, x: usize, y: usize) -> usize {
        self.band_offsets[band] + y * self.line_stride + x * self.pixel_stride
    }

    /// Statistics value of sample `(band, x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the sample lies outside the region.
    pub fn sample(&self, band: usize, x: usize, y: usize) -> f64 {
        let i = self.index(band, x, y);
        crate::dispatch_sample!(self.sample_type, T => {
            T::slice(&self.data).map_or(0.0, |s| s[i].to_f64())
        })
    }

    /// Returns `true` if `other` has the same width and height.
    #[inline]
    pub fn same_size(&self, other: &PixelRegion) -> bool {
        self.bounds.width == other.bounds.width && self.bounds.height == other.bounds.height
    }
}

fn storage_type(data: &SampleBuffer) -> SampleType {
    match data {
        SampleBuffer::Byte(_) => SampleType::Byte,
        SampleBuffer::UShort(_) => SampleType::UShort,
        SampleBuffer::Short(_) => SampleType::Short,
        SampleBuffer::Int(_) => SampleType::Int,
        SampleBuffer::Float(_) => SampleType::Float,
        SampleBuffer::Double(_) => SampleType::Double,
    }
}

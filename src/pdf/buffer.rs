//! Zero-copy access to a bitmap's pixel storage.

use crate::pdf::error::BindingError;
use crate::pdf::types::BitmapFormat;
use image::RgbaImage;
use std::io::Cursor;
use std::marker::PhantomData;

/// A read/write view over the pixels of a PDFium bitmap.
///
/// The view aliases PDFium's memory directly. Its lifetime is tied to the
/// [`crate::pdf::Library`] it came from, not to the bitmap: destroying the
/// bitmap while a view is alive leaves the view dangling, and any access
/// through it is undefined behaviour.
pub struct BitmapView<'a> {
    data: *mut u8,
    len: usize,
    width: u32,
    height: u32,
    stride: usize,
    format: BitmapFormat,
    _library: PhantomData<&'a ()>,
}

impl<'a> BitmapView<'a> {
    /// Build a view over `stride * height` bytes at `data`.
    ///
    /// Returns `None` when `data` is null or any dimension is negative.
    ///
    /// # Safety
    ///
    /// `data` must point to at least `stride * height` bytes that stay valid
    /// for `'a` and are not accessed through other references while the view
    /// is used.
    pub unsafe fn from_raw_parts(
        data: *mut u8,
        width: i32,
        height: i32,
        stride: i32,
        format: BitmapFormat,
    ) -> Option<Self> {
        if data.is_null() {
            return None;
        }
        let width = u32::try_from(width).ok()?;
        let height = u32::try_from(height).ok()?;
        let stride = usize::try_from(stride).ok()?;
        let len = stride.checked_mul(height as usize)?;

        Some(Self {
            data,
            len,
            width,
            height,
            stride,
            format,
            _library: PhantomData,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row, including padding.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> BitmapFormat {
        self.format
    }

    /// `stride * height`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: guaranteed by `from_raw_parts`.
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: guaranteed by `from_raw_parts`; `&mut self` keeps the slice unique.
        unsafe { std::slice::from_raw_parts_mut(self.data, self.len) }
    }

    /// Start of the aliased native storage.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data
    }

    /// One row of pixels without the stride padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let bpp = self.format.bytes_per_pixel()?;
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.stride;
        let end = start + self.width as usize * bpp;
        self.as_bytes().get(start..end)
    }

    /// Copy the pixels into an RGBA image.
    ///
    /// BGRx pixels come out opaque; gray pixels are replicated across the
    /// color channels.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, BindingError> {
        let bpp = self.format.bytes_per_pixel().ok_or_else(|| {
            BindingError::Image(format!("unsupported bitmap format {}", self.format.0))
        })?;

        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            let row = self
                .row(y)
                .ok_or_else(|| BindingError::Image(format!("row {} out of bounds", y)))?;
            for px in row.chunks_exact(bpp) {
                let rgba = match self.format {
                    BitmapFormat::GRAY => [px[0], px[0], px[0], 0xFF],
                    BitmapFormat::BGR | BitmapFormat::BGRX => [px[2], px[1], px[0], 0xFF],
                    _ => [px[2], px[1], px[0], px[3]],
                };
                pixels.extend_from_slice(&rgba);
            }
        }

        RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| BindingError::Image("pixel buffer size mismatch".to_string()))
    }

    /// Encode the pixels as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, BindingError> {
        let image = self.to_rgba_image()?;
        let mut png_bytes = Vec::new();

        image
            .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .map_err(|e| BindingError::Image(e.to_string()))?;

        Ok(png_bytes)
    }
}

//! Plain values passed through to PDFium.
//!
//! The named constants follow `fpdfview.h`. Every type accepts any raw value
//! so callers can use codes this crate does not name.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code reported by `FPDF_GetLastError`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const SUCCESS: Self = Self(0);
    pub const UNKNOWN: Self = Self(1);
    pub const FILE: Self = Self(2);
    pub const FORMAT: Self = Self(3);
    pub const PASSWORD: Self = Self(4);
    pub const SECURITY: Self = Self(5);
    pub const PAGE: Self = Self(6);

    /// Human readable description of the code.
    pub fn description(self) -> &'static str {
        match self {
            Self::SUCCESS => "No error",
            Self::UNKNOWN => "Unknown error",
            Self::FILE => "File not found or could not be opened",
            Self::FORMAT => "File not in PDF format or corrupted",
            Self::PASSWORD => "Password required or incorrect password",
            Self::SECURITY => "Unsupported security scheme",
            Self::PAGE => "Page not found or content error",
            _ => "Unrecognized error code",
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.description(), self.0)
    }
}

/// Page rotation in quarter turns, clockwise.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rotation(pub i32);

impl Rotation {
    pub const NONE: Self = Self(0);
    pub const DEGREES_90: Self = Self(1);
    pub const DEGREES_180: Self = Self(2);
    pub const DEGREES_270: Self = Self(3);

    /// Rotation in degrees (0, 90, 180, 270), or `None` for codes PDFium does not define.
    pub fn degrees(self) -> Option<u32> {
        match self.0 {
            0..=3 => Some(self.0 as u32 * 90),
            _ => None,
        }
    }
}

bitflags! {
    /// Flags for `FPDF_RenderPageBitmap`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: i32 {
        /// Render annotations.
        const ANNOT = 0x01;
        /// Use LCD text rendering.
        const LCD_TEXT = 0x02;
        /// Don't use the native text output available on some platforms.
        const NO_NATIVETEXT = 0x04;
        /// Grayscale output.
        const GRAYSCALE = 0x08;
        /// Output BGRA as RGBA.
        const REVERSE_BYTE_ORDER = 0x10;
        /// Limit image cache size.
        const LIMITED_IMAGE_CACHE = 0x200;
        /// Always use halftone for image stretching.
        const FORCE_HALFTONE = 0x400;
        /// Render for printing.
        const PRINTING = 0x800;
        /// Disable anti-aliasing on text.
        const NO_SMOOTH_TEXT = 0x1000;
        /// Disable anti-aliasing on images.
        const NO_SMOOTH_IMAGE = 0x2000;
        /// Disable anti-aliasing on paths.
        const NO_SMOOTH_PATH = 0x4000;
    }
}

/// Pixel layout of a bitmap, as in `FPDFBitmap_*` format constants.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitmapFormat(pub i32);

impl BitmapFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const GRAY: Self = Self(1);
    pub const BGR: Self = Self(2);
    pub const BGRX: Self = Self(3);
    pub const BGRA: Self = Self(4);

    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::GRAY => Some(1),
            Self::BGR => Some(3),
            Self::BGRX | Self::BGRA => Some(4),
            _ => None,
        }
    }
}

/// Device rectangle a page is mapped onto, in pixels.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub start_x: i32,
    pub start_y: i32,
    pub size_x: i32,
    pub size_y: i32,
}

impl Viewport {
    pub const fn new(start_x: i32, start_y: i32, size_x: i32, size_y: i32) -> Self {
        Self {
            start_x,
            start_y,
            size_x,
            size_y,
        }
    }

    /// A viewport anchored at the origin.
    pub const fn sized(size_x: i32, size_y: i32) -> Self {
        Self::new(0, 0, size_x, size_y)
    }
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Total number of pages
    pub page_count: i32,
    /// PDF version as reported by PDFium (14 for 1.4, 17 for 1.7), if known
    pub file_version: Option<i32>,
    /// Raw permission bits
    pub permissions: u64,
}

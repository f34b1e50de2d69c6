//! PDFium bindings.
//!
//! This module provides:
//! - Opaque document, page and bitmap handles
//! - The [`Library`] lifecycle object with one method per PDFium entry point
//! - Zero-copy bitmap views with PNG snapshots

mod buffer;
mod engine;
mod error;
mod handle;
mod library;
mod render;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use buffer::BitmapView;
pub use engine::{Engine, PdfiumEngine};
pub use error::BindingError;
pub use handle::{BitmapHandle, DocumentHandle, PageHandle};
pub use library::Library;
pub use render::{render_page_to_png, WHITE};
pub use types::{BitmapFormat, DocumentInfo, ErrorCode, RenderFlags, Rotation, Viewport};

//! The binding layer: one method per PDFium entry point.
//!
//! Every method is total. A null handle short-circuits to the documented
//! sentinel without calling into PDFium; any other failure is whatever
//! sentinel PDFium returns, with the cause available from
//! [`Library::last_error`].

use crate::config::BindingConfig;
use crate::pdf::buffer::BitmapView;
use crate::pdf::engine::{Engine, PdfiumEngine};
use crate::pdf::error::BindingError;
use crate::pdf::handle::{BitmapHandle, DocumentHandle, PageHandle};
use crate::pdf::types::{BitmapFormat, DocumentInfo, ErrorCode, RenderFlags, Rotation, Viewport};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

/// An initialized PDFium engine.
///
/// Creating a `Library` calls `FPDF_InitLibrary`; [`Library::destroy`] calls
/// `FPDF_DestroyLibrary`. Create at most one per process, and close every
/// document, page and bitmap before destroying it. Dropping a `Library`
/// without calling `destroy` leaves PDFium initialized until process exit.
pub struct Library {
    engine: Box<dyn Engine>,
    /// Copies of in-memory documents, kept until the document is closed.
    retained: Mutex<HashMap<DocumentHandle, Box<[u8]>>>,
}

impl Library {
    /// Bind the PDFium shared library described by `config` and initialize it.
    pub fn load(config: &BindingConfig) -> Result<Self, BindingError> {
        let engine = PdfiumEngine::bind(config)?;
        Ok(Self::with_engine(Box::new(engine)))
    }

    /// Initialize an already bound engine.
    pub fn with_engine(engine: Box<dyn Engine>) -> Self {
        engine.init_library();
        tracing::info!("PDFium library initialized");
        Self {
            engine,
            retained: Mutex::new(HashMap::new()),
        }
    }

    /// Tear the engine down. Every handle obtained from this library is dangling afterwards.
    pub fn destroy(self) {
        let leaked = self.retained.lock().len();
        if leaked > 0 {
            tracing::warn!("Destroying PDFium with {} in-memory documents still open", leaked);
        }
        self.engine.destroy_library();
        tracing::info!("PDFium library destroyed");
    }

    /// Error code of the most recent failing call on this thread.
    pub fn last_error(&self) -> ErrorCode {
        ErrorCode(self.engine.last_error())
    }

    // ========== Documents ==========

    /// Open a document from a file. Returns the null handle on failure.
    pub fn load_document(&self, path: impl AsRef<Path>, password: Option<&str>) -> DocumentHandle {
        let path = path.as_ref();
        // PDFium takes UTF-8 paths. A lossy path still reaches PDFium so it
        // records the failure in `last_error`.
        let path_str = path.to_string_lossy();
        if let Cow::Owned(_) = path_str {
            tracing::warn!("Document path {:?} is not UTF-8", path);
        }

        let document = self.engine.load_document(&path_str, password);
        if document.is_null() {
            tracing::debug!("Failed to load {:?}: {}", path, self.last_error());
        }
        document
    }

    /// Open a document from bytes. The bytes are copied and kept until the
    /// document is closed. Returns the null handle on failure.
    pub fn load_mem_document(&self, bytes: &[u8], password: Option<&str>) -> DocumentHandle {
        let retained: Box<[u8]> = bytes.into();
        let document = self.engine.load_mem_document(&retained, password);
        if document.is_null() {
            tracing::debug!("Failed to load {} byte document: {}", bytes.len(), self.last_error());
            return document;
        }

        self.retained.lock().insert(document, retained);
        document
    }

    /// Open a document from caller-owned memory without copying it.
    ///
    /// Returns the null handle if `data` is null, `capacity` is not positive,
    /// or PDFium rejects the data.
    ///
    /// # Safety
    ///
    /// `data` must point to `capacity` readable bytes that stay valid and
    /// unmodified until the returned document is closed.
    pub unsafe fn load_mem_view(
        &self,
        data: *const u8,
        capacity: i64,
        password: Option<&str>,
    ) -> DocumentHandle {
        if data.is_null() || capacity <= 0 {
            tracing::warn!("Rejecting memory view at {:?} with capacity {}", data, capacity);
            return DocumentHandle::NULL;
        }
        let Ok(len) = usize::try_from(capacity) else {
            return DocumentHandle::NULL;
        };

        // SAFETY: upheld by the caller.
        let bytes = unsafe { std::slice::from_raw_parts(data, len) };
        let document = self.engine.load_mem_document(bytes, password);
        if document.is_null() {
            tracing::debug!("Failed to load memory view: {}", self.last_error());
        }
        document
    }

    /// Close a document. Pages loaded from it must already be closed.
    pub fn close_document(&self, document: DocumentHandle) {
        if document.is_null() {
            tracing::trace!("close_document: null handle");
            return;
        }
        self.engine.close_document(document);
        self.retained.lock().remove(&document);
    }

    pub fn page_count(&self, document: DocumentHandle) -> i32 {
        if document.is_null() {
            return 0;
        }
        self.engine.page_count(document)
    }

    /// File version (14 for PDF 1.4), or -1 when unknown.
    pub fn file_version(&self, document: DocumentHandle) -> i32 {
        if document.is_null() {
            return -1;
        }
        self.engine.file_version(document).unwrap_or(-1)
    }

    pub fn doc_permissions(&self, document: DocumentHandle) -> u64 {
        if document.is_null() {
            return 0;
        }
        self.engine.doc_permissions(document)
    }

    /// Page count, version and permissions in one value.
    pub fn document_info(&self, document: DocumentHandle) -> Option<DocumentInfo> {
        if document.is_null() {
            return None;
        }
        let version = self.file_version(document);
        Some(DocumentInfo {
            page_count: self.page_count(document),
            file_version: (version >= 0).then_some(version),
            permissions: self.doc_permissions(document),
        })
    }

    // ========== Pages ==========

    pub fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        if document.is_null() {
            return PageHandle::NULL;
        }
        self.engine.load_page(document, index)
    }

    pub fn close_page(&self, page: PageHandle) {
        if page.is_null() {
            tracing::trace!("close_page: null handle");
            return;
        }
        self.engine.close_page(page);
    }

    /// Page width in points (1/72 inch).
    pub fn page_width(&self, page: PageHandle) -> f64 {
        if page.is_null() {
            return 0.0;
        }
        self.engine.page_width(page)
    }

    /// Page height in points (1/72 inch).
    pub fn page_height(&self, page: PageHandle) -> f64 {
        if page.is_null() {
            return 0.0;
        }
        self.engine.page_height(page)
    }

    /// `[width, height]` of a page without loading it.
    pub fn page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<[f64; 2]> {
        if document.is_null() {
            return None;
        }
        self.engine
            .page_size_by_index(document, index)
            .map(|(width, height)| [width, height])
    }

    // ========== Bitmaps ==========

    /// A BGRA (`alpha`) or BGRx bitmap. Returns the null handle for non-positive sizes.
    pub fn create_bitmap(&self, width: i32, height: i32, alpha: bool) -> BitmapHandle {
        if width <= 0 || height <= 0 {
            tracing::warn!("Rejecting bitmap of size {}x{}", width, height);
            return BitmapHandle::NULL;
        }
        self.engine.bitmap_create(width, height, alpha)
    }

    /// A bitmap in an explicit format, with storage owned by PDFium.
    pub fn create_bitmap_with_format(
        &self,
        width: i32,
        height: i32,
        format: BitmapFormat,
    ) -> BitmapHandle {
        if width <= 0 || height <= 0 {
            tracing::warn!("Rejecting bitmap of size {}x{}", width, height);
            return BitmapHandle::NULL;
        }
        self.engine.bitmap_create_ex(width, height, format.0)
    }

    pub fn destroy_bitmap(&self, bitmap: BitmapHandle) {
        if bitmap.is_null() {
            tracing::trace!("destroy_bitmap: null handle");
            return;
        }
        self.engine.bitmap_destroy(bitmap);
    }

    /// Fill a rectangle with an `0xAARRGGBB` color.
    pub fn fill_rect(
        &self,
        bitmap: BitmapHandle,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    ) -> bool {
        if bitmap.is_null() {
            return false;
        }
        self.engine
            .bitmap_fill_rect(bitmap, left, top, width, height, color)
    }

    /// Zero-copy view of the bitmap's pixels, `stride * height` bytes long.
    ///
    /// # Safety
    ///
    /// The view aliases memory owned by PDFium and nothing tracks its use:
    ///
    /// - `bitmap` must not be destroyed while the view is alive.
    /// - No other view of the same bitmap may be used while this one is, and
    ///   PDFium must not write to the bitmap (fill, render) in the meantime.
    ///
    /// ```compile_fail
    /// # use pdfium_bridge_lib::pdf::{BitmapHandle, Library};
    /// fn pixels(library: &Library, bitmap: BitmapHandle) -> usize {
    ///     library.bitmap_buffer(bitmap).map(|view| view.len()).unwrap_or(0)
    /// }
    /// ```
    pub unsafe fn bitmap_buffer(&self, bitmap: BitmapHandle) -> Option<BitmapView<'_>> {
        if bitmap.is_null() {
            return None;
        }
        let data = self.engine.bitmap_buffer(bitmap);
        if data.is_null() {
            return None;
        }

        let width = self.engine.bitmap_width(bitmap);
        let height = self.engine.bitmap_height(bitmap);
        let stride = self.engine.bitmap_stride(bitmap);
        let format = BitmapFormat(self.engine.bitmap_format(bitmap));

        // SAFETY: PDFium reports `stride * height` bytes behind `data` for a live bitmap.
        unsafe { BitmapView::from_raw_parts(data, width, height, stride, format) }
    }

    /// Bytes per row, or 0 for the null handle.
    pub fn bitmap_stride(&self, bitmap: BitmapHandle) -> i32 {
        if bitmap.is_null() {
            return 0;
        }
        self.engine.bitmap_stride(bitmap)
    }

    // ========== Rendering ==========

    /// Render `page` into `viewport` of `bitmap`. Failures are only visible through
    /// [`Library::last_error`].
    pub fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: Viewport,
        rotation: Rotation,
        flags: RenderFlags,
    ) {
        if bitmap.is_null() || page.is_null() {
            tracing::trace!("render_page_bitmap: null handle");
            return;
        }
        self.engine
            .render_page_bitmap(bitmap, page, viewport, rotation.0, flags.bits());
    }

    // ========== Coordinates ==========

    /// Map a device pixel inside `viewport` to page space.
    pub fn device_to_page(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotation: Rotation,
        device_x: i32,
        device_y: i32,
    ) -> Option<[f64; 2]> {
        if page.is_null() {
            return None;
        }
        self.engine
            .device_to_page(page, viewport, rotation.0, device_x, device_y)
            .map(|(x, y)| [x, y])
    }

    /// Map a page-space point to a device pixel inside `viewport`.
    pub fn page_to_device(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotation: Rotation,
        page_x: f64,
        page_y: f64,
    ) -> Option<[i32; 2]> {
        if page.is_null() {
            return None;
        }
        self.engine
            .page_to_device(page, viewport, rotation.0, page_x, page_y)
            .map(|(x, y)| [x, y])
    }

    #[cfg(test)]
    pub(crate) fn retained_documents(&self) -> usize {
        self.retained.lock().len()
    }
}

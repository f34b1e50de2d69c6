//! The PDFium entry points the binding layer forwards to.
//!
//! [`Engine`] mirrors the C API one call at a time, with pointers replaced by
//! handle newtypes and out-parameters folded into `Option`s. The production
//! implementation, [`PdfiumEngine`], forwards each call to `pdfium-render`'s
//! raw `FPDF_*` bindings without touching the arguments.
//!
//! Note: pdfium-render's bindings are not Send+Sync. PDFium itself is the
//! authority on which calls may run concurrently, so [`PdfiumEngine`] asserts
//! both and leaves per-handle serialization to the caller.

use crate::config::BindingConfig;
use crate::pdf::error::BindingError;
use crate::pdf::handle::{BitmapHandle, DocumentHandle, PageHandle};
use crate::pdf::types::Viewport;
use pdfium_render::prelude::*;
use std::path::Path;

/// Raw PDFium operations used by [`crate::pdf::Library`].
///
/// Implementations may assume every handle argument is non-null; the
/// library filters null handles before calling in.
pub trait Engine: Send + Sync {
    fn init_library(&self);
    fn destroy_library(&self);
    fn last_error(&self) -> u32;

    fn load_document(&self, path: &str, password: Option<&str>) -> DocumentHandle;
    /// PDFium keeps reading `bytes` after this returns; the caller keeps them alive
    /// until the document is closed.
    fn load_mem_document(&self, bytes: &[u8], password: Option<&str>) -> DocumentHandle;
    fn close_document(&self, document: DocumentHandle);

    fn page_count(&self, document: DocumentHandle) -> i32;
    fn file_version(&self, document: DocumentHandle) -> Option<i32>;
    fn doc_permissions(&self, document: DocumentHandle) -> u64;

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle;
    fn close_page(&self, page: PageHandle);
    fn page_width(&self, page: PageHandle) -> f64;
    fn page_height(&self, page: PageHandle) -> f64;
    fn page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<(f64, f64)>;

    fn bitmap_create(&self, width: i32, height: i32, alpha: bool) -> BitmapHandle;
    fn bitmap_create_ex(&self, width: i32, height: i32, format: i32) -> BitmapHandle;
    fn bitmap_destroy(&self, bitmap: BitmapHandle);
    fn bitmap_fill_rect(
        &self,
        bitmap: BitmapHandle,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    ) -> bool;
    fn bitmap_buffer(&self, bitmap: BitmapHandle) -> *mut u8;
    fn bitmap_width(&self, bitmap: BitmapHandle) -> i32;
    fn bitmap_height(&self, bitmap: BitmapHandle) -> i32;
    fn bitmap_stride(&self, bitmap: BitmapHandle) -> i32;
    fn bitmap_format(&self, bitmap: BitmapHandle) -> i32;

    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        flags: i32,
    );
    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        device_x: i32,
        device_y: i32,
    ) -> Option<(f64, f64)>;
    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        page_x: f64,
        page_y: f64,
    ) -> Option<(i32, i32)>;
}

/// `FPDFBitmap_FillRect` returns nothing on PDFium builds older than chromium/6569.
trait FillOutcome {
    fn succeeded(self) -> bool;
}

impl FillOutcome for () {
    fn succeeded(self) -> bool {
        true
    }
}

impl FillOutcome for i32 {
    fn succeeded(self) -> bool {
        self != 0
    }
}

/// [`Engine`] backed by a dynamically bound PDFium library.
pub struct PdfiumEngine {
    bindings: Box<dyn PdfiumLibraryBindings>,
}

// SAFETY: the bindings are a table of C function pointers plus the loaded
// library. Thread-safety of the calls made through them is PDFium's contract.
unsafe impl Send for PdfiumEngine {}
unsafe impl Sync for PdfiumEngine {}

impl PdfiumEngine {
    pub fn from_bindings(bindings: Box<dyn PdfiumLibraryBindings>) -> Self {
        Self { bindings }
    }

    /// Bind to the PDFium shared library.
    ///
    /// Tries, in order: the configured library path, the configured library
    /// directory, the executable's directory (and the macOS app bundle's
    /// `Frameworks`), then the system library.
    pub fn bind(config: &BindingConfig) -> Result<Self, BindingError> {
        let mut failures = Vec::new();

        let mut candidates = Vec::new();
        if let Some(path) = &config.library_path {
            candidates.push(path.clone());
        }
        if let Some(dir) = &config.library_dir {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(dir));
        }
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                candidates.push(Pdfium::pdfium_platform_library_name_at_path(exe_dir));

                // exe_path is Contents/MacOS/<app>, the library lives in Contents/Frameworks
                #[cfg(target_os = "macos")]
                if let Ok(frameworks) = exe_dir.join("..").join("Frameworks").canonicalize() {
                    candidates.push(Pdfium::pdfium_platform_library_name_at_path(&frameworks));
                }
            }
        }

        for candidate in &candidates {
            if let Some(engine) = Self::try_bind_path(candidate, &mut failures) {
                return Ok(engine);
            }
        }

        match Pdfium::bind_to_system_library() {
            Ok(bindings) => {
                tracing::info!("Bound system PDFium library");
                return Ok(Self::from_bindings(bindings));
            }
            Err(e) => {
                tracing::debug!("Failed to bind system PDFium library: {:?}", e);
                failures.push(format!("system library: {:?}", e));
            }
        }

        Err(BindingError::Bind(failures.join("; ")))
    }

    fn try_bind_path(path: &Path, failures: &mut Vec<String>) -> Option<Self> {
        if !path.exists() {
            tracing::trace!("Skipping missing PDFium candidate {:?}", path);
            failures.push(format!("{}: not found", path.display()));
            return None;
        }

        match Pdfium::bind_to_library(path) {
            Ok(bindings) => {
                tracing::info!("Bound PDFium library at {:?}", path);
                Some(Self::from_bindings(bindings))
            }
            Err(e) => {
                tracing::debug!("Failed to bind PDFium at {:?}: {:?}", path, e);
                failures.push(format!("{}: {:?}", path.display(), e));
                None
            }
        }
    }
}

impl Engine for PdfiumEngine {
    fn init_library(&self) {
        self.bindings.FPDF_InitLibrary();
    }

    fn destroy_library(&self) {
        self.bindings.FPDF_DestroyLibrary();
    }

    fn last_error(&self) -> u32 {
        self.bindings.FPDF_GetLastError() as u32
    }

    fn load_document(&self, path: &str, password: Option<&str>) -> DocumentHandle {
        DocumentHandle::from_ptr(self.bindings.FPDF_LoadDocument(path, password))
    }

    fn load_mem_document(&self, bytes: &[u8], password: Option<&str>) -> DocumentHandle {
        DocumentHandle::from_ptr(self.bindings.FPDF_LoadMemDocument64(bytes, password))
    }

    fn close_document(&self, document: DocumentHandle) {
        self.bindings.FPDF_CloseDocument(document.as_ptr());
    }

    fn page_count(&self, document: DocumentHandle) -> i32 {
        self.bindings.FPDF_GetPageCount(document.as_ptr())
    }

    fn file_version(&self, document: DocumentHandle) -> Option<i32> {
        let mut version = 0;
        if self.bindings.FPDF_GetFileVersion(document.as_ptr(), &mut version) != 0 {
            Some(version)
        } else {
            None
        }
    }

    fn doc_permissions(&self, document: DocumentHandle) -> u64 {
        self.bindings.FPDF_GetDocPermissions(document.as_ptr()) as u64
    }

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        PageHandle::from_ptr(self.bindings.FPDF_LoadPage(document.as_ptr(), index))
    }

    fn close_page(&self, page: PageHandle) {
        self.bindings.FPDF_ClosePage(page.as_ptr());
    }

    fn page_width(&self, page: PageHandle) -> f64 {
        self.bindings.FPDF_GetPageWidthF(page.as_ptr()) as f64
    }

    fn page_height(&self, page: PageHandle) -> f64 {
        self.bindings.FPDF_GetPageHeightF(page.as_ptr()) as f64
    }

    fn page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<(f64, f64)> {
        let mut width = 0.0;
        let mut height = 0.0;
        let result = self.bindings.FPDF_GetPageSizeByIndex(
            document.as_ptr(),
            index,
            &mut width,
            &mut height,
        );
        (result != 0).then_some((width, height))
    }

    fn bitmap_create(&self, width: i32, height: i32, alpha: bool) -> BitmapHandle {
        BitmapHandle::from_ptr(self.bindings.FPDFBitmap_Create(width, height, alpha as i32))
    }

    fn bitmap_create_ex(&self, width: i32, height: i32, format: i32) -> BitmapHandle {
        // No external buffer: PDFium allocates and owns the pixels.
        BitmapHandle::from_ptr(self.bindings.FPDFBitmap_CreateEx(
            width,
            height,
            format,
            std::ptr::null_mut(),
            0,
        ))
    }

    fn bitmap_destroy(&self, bitmap: BitmapHandle) {
        self.bindings.FPDFBitmap_Destroy(bitmap.as_ptr());
    }

    fn bitmap_fill_rect(
        &self,
        bitmap: BitmapHandle,
        left: i32,
        top: i32,
        width: i32,
        height: i32,
        color: u32,
    ) -> bool {
        self.bindings
            .FPDFBitmap_FillRect(bitmap.as_ptr(), left, top, width, height, color as _)
            .succeeded()
    }

    fn bitmap_buffer(&self, bitmap: BitmapHandle) -> *mut u8 {
        self.bindings.FPDFBitmap_GetBuffer(bitmap.as_ptr()).cast::<u8>()
    }

    fn bitmap_width(&self, bitmap: BitmapHandle) -> i32 {
        self.bindings.FPDFBitmap_GetWidth(bitmap.as_ptr())
    }

    fn bitmap_height(&self, bitmap: BitmapHandle) -> i32 {
        self.bindings.FPDFBitmap_GetHeight(bitmap.as_ptr())
    }

    fn bitmap_stride(&self, bitmap: BitmapHandle) -> i32 {
        self.bindings.FPDFBitmap_GetStride(bitmap.as_ptr())
    }

    fn bitmap_format(&self, bitmap: BitmapHandle) -> i32 {
        self.bindings.FPDFBitmap_GetFormat(bitmap.as_ptr())
    }

    fn render_page_bitmap(
        &self,
        bitmap: BitmapHandle,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        flags: i32,
    ) {
        self.bindings.FPDF_RenderPageBitmap(
            bitmap.as_ptr(),
            page.as_ptr(),
            viewport.start_x,
            viewport.start_y,
            viewport.size_x,
            viewport.size_y,
            rotate,
            flags,
        );
    }

    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        device_x: i32,
        device_y: i32,
    ) -> Option<(f64, f64)> {
        let mut page_x = 0.0;
        let mut page_y = 0.0;
        let result = self.bindings.FPDF_DeviceToPage(
            page.as_ptr(),
            viewport.start_x,
            viewport.start_y,
            viewport.size_x,
            viewport.size_y,
            rotate,
            device_x,
            device_y,
            &mut page_x,
            &mut page_y,
        );
        (result != 0).then_some((page_x, page_y))
    }

    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        page_x: f64,
        page_y: f64,
    ) -> Option<(i32, i32)> {
        let mut device_x = 0;
        let mut device_y = 0;
        let result = self.bindings.FPDF_PageToDevice(
            page.as_ptr(),
            viewport.start_x,
            viewport.start_y,
            viewport.size_x,
            viewport.size_y,
            rotate,
            page_x,
            page_y,
            &mut device_x,
            &mut device_y,
        );
        (result != 0).then_some((device_x, device_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_outcome() {
        assert!(().succeeded());
        assert!(1i32.succeeded());
        assert!(!0i32.succeeded());
    }

    #[test]
    fn test_bind_reports_every_candidate() {
        let config = BindingConfig::default().with_library_path("/nonexistent/libpdfium.so");
        // A system PDFium may be installed; only the failure report is checked.
        if let Err(BindingError::Bind(report)) = PdfiumEngine::bind(&config) {
            assert!(report.contains("/nonexistent/libpdfium.so: not found"));
            assert!(report.contains("system library"));
        }
    }
}

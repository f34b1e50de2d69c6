//! C ABI entry points.
//!
//! These functions expose the binding layer to managed runtimes (JNA or
//! Panama on the JVM, P/Invoke, ctypes, ...). Handles cross the boundary as
//! 64-bit integers and zero is always the null handle.
//!
//! Every function is total: failure is reported through a sentinel (null
//! handle, 0, -1, `false` or a null pointer) and the cause, where PDFium
//! records one, through [`pdfium_get_last_error`]. Nothing here panics or
//! unwinds into the caller.
//!
//! `pdfium_init_library` must be called once before anything else and
//! `pdfium_destroy_library` once after everything else. Until then every
//! call returns its failure sentinel.

use crate::config::{init_logging, BindingConfig};
use crate::pdf::{
    BindingError, BitmapFormat, BitmapHandle, DocumentHandle, ErrorCode, Library, PageHandle,
    RenderFlags, Rotation, Viewport,
};
use parking_lot::RwLock;
use std::borrow::Cow;
use std::ffi::{c_char, CStr};

/// The active library. The lock only orders init/destroy against other
/// calls; handle operations share read access and run concurrently.
static LIBRARY: RwLock<Option<Library>> = parking_lot::const_rwlock(None);

fn with_library<R>(sentinel: R, f: impl FnOnce(&Library) -> R) -> R {
    match LIBRARY.read().as_ref() {
        Some(library) => f(library),
        None => {
            tracing::debug!("PDFium call before pdfium_init_library");
            sentinel
        }
    }
}

/// Build and activate a library unless one is already active.
///
/// The write lock is held across `load`: PDFium must never be initialized
/// twice. Returns `true` if a library is active afterwards.
fn install_with(load: impl FnOnce() -> Result<Library, BindingError>) -> bool {
    let mut slot = LIBRARY.write();
    if slot.is_some() {
        tracing::warn!("pdfium_init_library called while already initialized");
        return true;
    }
    match load() {
        Ok(library) => {
            *slot = Some(library);
            true
        }
        Err(e) => {
            tracing::error!("{}", e);
            false
        }
    }
}

/// Borrow a nul-terminated string, replacing invalid UTF-8 so the call
/// still reaches PDFium and sets its last error.
unsafe fn optional_str<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: the caller passes a valid nul-terminated string.
    let s = unsafe { CStr::from_ptr(ptr) }.to_string_lossy();
    if let Cow::Owned(_) = s {
        tracing::warn!("String argument is not UTF-8: {:?}", s);
    }
    Some(s)
}

// ========== Initialization ==========

/// Bind and initialize PDFium.
///
/// The library is located through `PDFIUM_LIB_PATH`, `PDFIUM_LIB_DIR`, the
/// executable's directory and finally the system library path. Returns
/// `false` if PDFium could not be bound. Calling it again while initialized
/// is a no-op returning `true`.
#[no_mangle]
pub extern "C" fn pdfium_init_library() -> bool {
    let config = BindingConfig::from_env();
    init_logging(&config);
    install_with(|| Library::load(&config))
}

/// Tear PDFium down. All handles become invalid.
#[no_mangle]
pub extern "C" fn pdfium_destroy_library() {
    let library = LIBRARY.write().take();
    match library {
        Some(library) => library.destroy(),
        None => tracing::debug!("pdfium_destroy_library called while not initialized"),
    }
}

/// Error code of the most recent failure (see `ErrorCode`). Returns
/// `FPDF_ERR_UNKNOWN` (1) when PDFium is not initialized.
#[no_mangle]
pub extern "C" fn pdfium_get_last_error() -> i32 {
    with_library(ErrorCode::UNKNOWN, Library::last_error).0 as i32
}

// ========== Documents ==========

/// Open a document from a file path.
///
/// # Safety
///
/// `path` must be a valid nul-terminated string; `password` must be null
/// or a valid nul-terminated string.
#[no_mangle]
pub unsafe extern "C" fn pdfium_load_document(
    path: *const c_char,
    password: *const c_char,
) -> DocumentHandle {
    // SAFETY: upheld by the caller.
    let Some(path) = (unsafe { optional_str(path) }) else {
        return DocumentHandle::NULL;
    };
    // SAFETY: upheld by the caller.
    let password = unsafe { optional_str(password) };
    with_library(DocumentHandle::NULL, |library| {
        library.load_document(&*path, password.as_deref())
    })
}

/// Open a document from a byte array. The bytes are copied, so the array
/// can be released as soon as this returns.
///
/// # Safety
///
/// `data` must be null or point to `len` readable bytes; `password` must be
/// null or a valid nul-terminated string.
#[no_mangle]
pub unsafe extern "C" fn pdfium_load_mem_document(
    data: *const u8,
    len: usize,
    password: *const c_char,
) -> DocumentHandle {
    if data.is_null() {
        return DocumentHandle::NULL;
    }
    // SAFETY: upheld by the caller.
    let password = unsafe { optional_str(password) };
    // SAFETY: upheld by the caller.
    let bytes = unsafe { std::slice::from_raw_parts(data, len) };
    with_library(DocumentHandle::NULL, |library| {
        library.load_mem_document(bytes, password.as_deref())
    })
}

/// Open a document directly from caller-owned memory (a direct buffer).
/// Fails if `data` is null or `capacity` is not positive.
///
/// # Safety
///
/// `data` must point to `capacity` readable bytes that stay valid until the
/// document is closed; `password` must be null or a valid nul-terminated
/// string.
#[no_mangle]
pub unsafe extern "C" fn pdfium_load_direct_buffer(
    data: *const u8,
    capacity: i64,
    password: *const c_char,
) -> DocumentHandle {
    // SAFETY: upheld by the caller.
    let password = unsafe { optional_str(password) };
    with_library(DocumentHandle::NULL, |library| {
        // SAFETY: upheld by the caller.
        unsafe { library.load_mem_view(data, capacity, password.as_deref()) }
    })
}

#[no_mangle]
pub extern "C" fn pdfium_close_document(document: DocumentHandle) {
    with_library((), |library| library.close_document(document));
}

#[no_mangle]
pub extern "C" fn pdfium_get_page_count(document: DocumentHandle) -> i32 {
    with_library(0, |library| library.page_count(document))
}

/// PDF version (14 for 1.4, 15 for 1.5, ...) or -1.
#[no_mangle]
pub extern "C" fn pdfium_get_file_version(document: DocumentHandle) -> i32 {
    with_library(-1, |library| library.file_version(document))
}

#[no_mangle]
pub extern "C" fn pdfium_get_doc_permissions(document: DocumentHandle) -> u64 {
    with_library(0, |library| library.doc_permissions(document))
}

// ========== Pages ==========

#[no_mangle]
pub extern "C" fn pdfium_load_page(document: DocumentHandle, page_index: i32) -> PageHandle {
    with_library(PageHandle::NULL, |library| {
        library.load_page(document, page_index)
    })
}

#[no_mangle]
pub extern "C" fn pdfium_close_page(page: PageHandle) {
    with_library((), |library| library.close_page(page));
}

#[no_mangle]
pub extern "C" fn pdfium_get_page_width(page: PageHandle) -> f64 {
    with_library(0.0, |library| library.page_width(page))
}

#[no_mangle]
pub extern "C" fn pdfium_get_page_height(page: PageHandle) -> f64 {
    with_library(0.0, |library| library.page_height(page))
}

/// Write `[width, height]` of a page to `out_size` without loading the page.
/// Returns `false` and leaves `out_size` untouched on failure.
///
/// # Safety
///
/// `out_size` must be null or point to two writable `f64`s.
#[no_mangle]
pub unsafe extern "C" fn pdfium_get_page_size_by_index(
    document: DocumentHandle,
    page_index: i32,
    out_size: *mut f64,
) -> bool {
    if out_size.is_null() {
        return false;
    }
    let Some(size) = with_library(None, |library| {
        library.page_size_by_index(document, page_index)
    }) else {
        return false;
    };
    // SAFETY: upheld by the caller.
    unsafe { std::slice::from_raw_parts_mut(out_size, 2) }.copy_from_slice(&size);
    true
}

// ========== Bitmaps ==========

/// A BGRA (`alpha`) or BGRx bitmap. Returns 0 for non-positive sizes.
#[no_mangle]
pub extern "C" fn pdfium_create_bitmap(width: i32, height: i32, alpha: bool) -> BitmapHandle {
    with_library(BitmapHandle::NULL, |library| {
        library.create_bitmap(width, height, alpha)
    })
}

/// A bitmap in one of the `FPDFBitmap_*` formats, backed by PDFium-owned memory.
#[no_mangle]
pub extern "C" fn pdfium_create_bitmap_ex(width: i32, height: i32, format: i32) -> BitmapHandle {
    with_library(BitmapHandle::NULL, |library| {
        library.create_bitmap_with_format(width, height, BitmapFormat(format))
    })
}

#[no_mangle]
pub extern "C" fn pdfium_destroy_bitmap(bitmap: BitmapHandle) {
    with_library((), |library| library.destroy_bitmap(bitmap));
}

/// Fill a rectangle with an `0xAARRGGBB` color.
#[no_mangle]
pub extern "C" fn pdfium_fill_rect(
    bitmap: BitmapHandle,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    color: u32,
) -> bool {
    with_library(false, |library| {
        library.fill_rect(bitmap, left, top, width, height, color)
    })
}

/// Pointer to the bitmap's pixels; `stride * height` bytes are written to
/// `out_len`. Returns null when there is no buffer.
///
/// The memory belongs to the bitmap and is freed by `pdfium_destroy_bitmap`.
///
/// # Safety
///
/// `out_len` must be null or point to a writable `usize`.
#[no_mangle]
pub unsafe extern "C" fn pdfium_get_bitmap_buffer(
    bitmap: BitmapHandle,
    out_len: *mut usize,
) -> *mut u8 {
    let (data, len) = with_library((std::ptr::null_mut(), 0), |library| {
        // SAFETY: only the address escapes; the caller owns the aliasing rules.
        match unsafe { library.bitmap_buffer(bitmap) } {
            Some(mut view) => (view.as_mut_ptr(), view.len()),
            None => (std::ptr::null_mut(), 0),
        }
    });
    if !out_len.is_null() {
        // SAFETY: upheld by the caller.
        unsafe { out_len.write(len) };
    }
    data
}

#[no_mangle]
pub extern "C" fn pdfium_get_bitmap_stride(bitmap: BitmapHandle) -> i32 {
    with_library(0, |library| library.bitmap_stride(bitmap))
}

// ========== Rendering ==========

/// Render `page` into the given rectangle of `bitmap`. `rotate` is 0-3
/// quarter turns; `flags` is a combination of `FPDF_*` render flags.
#[no_mangle]
pub extern "C" fn pdfium_render_page_bitmap(
    bitmap: BitmapHandle,
    page: PageHandle,
    start_x: i32,
    start_y: i32,
    size_x: i32,
    size_y: i32,
    rotate: i32,
    flags: i32,
) {
    with_library((), |library| {
        library.render_page_bitmap(
            bitmap,
            page,
            Viewport::new(start_x, start_y, size_x, size_y),
            Rotation(rotate),
            RenderFlags::from_bits_retain(flags),
        );
    });
}

// ========== Coordinates ==========

/// Convert a device point to page coordinates, written to `out_point` as `[x, y]`.
///
/// # Safety
///
/// `out_point` must be null or point to two writable `f64`s.
#[no_mangle]
pub unsafe extern "C" fn pdfium_device_to_page(
    page: PageHandle,
    start_x: i32,
    start_y: i32,
    size_x: i32,
    size_y: i32,
    rotate: i32,
    device_x: i32,
    device_y: i32,
    out_point: *mut f64,
) -> bool {
    if out_point.is_null() {
        return false;
    }
    let viewport = Viewport::new(start_x, start_y, size_x, size_y);
    let Some(point) = with_library(None, |library| {
        library.device_to_page(page, viewport, Rotation(rotate), device_x, device_y)
    }) else {
        return false;
    };
    // SAFETY: upheld by the caller.
    unsafe { std::slice::from_raw_parts_mut(out_point, 2) }.copy_from_slice(&point);
    true
}

/// Convert a page point to device coordinates, written to `out_point` as `[x, y]`.
///
/// # Safety
///
/// `out_point` must be null or point to two writable `i32`s.
#[no_mangle]
pub unsafe extern "C" fn pdfium_page_to_device(
    page: PageHandle,
    start_x: i32,
    start_y: i32,
    size_x: i32,
    size_y: i32,
    rotate: i32,
    page_x: f64,
    page_y: f64,
    out_point: *mut i32,
) -> bool {
    if out_point.is_null() {
        return false;
    }
    let viewport = Viewport::new(start_x, start_y, size_x, size_y);
    let Some(point) = with_library(None, |library| {
        library.page_to_device(page, viewport, Rotation(rotate), page_x, page_y)
    }) else {
        return false;
    };
    // SAFETY: upheld by the caller.
    unsafe { std::slice::from_raw_parts_mut(out_point, 2) }.copy_from_slice(&point);
    true
}

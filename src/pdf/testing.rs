//! In-memory [`Engine`] used by the unit tests.
//!
//! Documents are recognized by a `%PDF-1.7` header and always have two
//! US Letter pages. Bitmaps are real heap buffers in BGRA/BGRx/BGR/gray
//! layout, so buffer views can be checked byte for byte.

use crate::pdf::engine::Engine;
use crate::pdf::handle::{BitmapHandle, DocumentHandle, PageHandle};
use crate::pdf::types::{BitmapFormat, ErrorCode, Viewport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const PAGES: i32 = 2;

struct FakeBitmap {
    width: i32,
    height: i32,
    stride: i32,
    format: BitmapFormat,
    pixels: Box<[u8]>,
}

#[derive(Default)]
struct State {
    calls: Vec<&'static str>,
    last_error: u32,
    next_handle: u64,
    documents: HashMap<DocumentHandle, ()>,
    pages: HashMap<PageHandle, DocumentHandle>,
    bitmaps: HashMap<BitmapHandle, FakeBitmap>,
}

impl State {
    fn record(&mut self, call: &'static str) {
        self.calls.push(call);
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 0x100;
        self.next_handle
    }

    fn open_document(&mut self, bytes: &[u8]) -> DocumentHandle {
        if !bytes.starts_with(b"%PDF-") {
            self.last_error = ErrorCode::FORMAT.0;
            return DocumentHandle::NULL;
        }
        let handle = DocumentHandle::from_raw(self.next());
        self.documents.insert(handle, ());
        self.last_error = ErrorCode::SUCCESS.0;
        handle
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingEngine {
    state: Arc<Mutex<State>>,
}

impl RecordingEngine {
    pub(crate) const PERMISSIONS: u64 = 0xFFFF_FFFC;

    pub(crate) fn sample_document() -> Vec<u8> {
        b"%PDF-1.7\n%fake\n%%EOF\n".to_vec()
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.state.lock().calls.clone()
    }

    fn create(&self, call: &'static str, width: i32, height: i32, format: BitmapFormat) -> BitmapHandle {
        let mut state = self.state.lock();
        state.record(call);
        let Some(bpp) = format.bytes_per_pixel() else {
            return BitmapHandle::NULL;
        };
        // Rows are padded to 4 bytes, as PDFium does.
        let stride = (width * bpp as i32 + 3) & !3;
        let handle = BitmapHandle::from_raw(state.next());
        state.bitmaps.insert(
            handle,
            FakeBitmap {
                width,
                height,
                stride,
                format,
                pixels: vec![0; (stride * height) as usize].into_boxed_slice(),
            },
        );
        handle
    }

    fn bitmap_field(&self, call: &'static str, bitmap: BitmapHandle, f: impl Fn(&FakeBitmap) -> i32) -> i32 {
        let mut state = self.state.lock();
        state.record(call);
        state.bitmaps.get(&bitmap).map(f).unwrap_or(0)
    }
}

fn scale(viewport: Viewport) -> (f64, f64) {
    (
        viewport.size_x as f64 / PAGE_WIDTH,
        viewport.size_y as f64 / PAGE_HEIGHT,
    )
}

impl Engine for RecordingEngine {
    fn init_library(&self) {
        self.state.lock().record("init_library");
    }

    fn destroy_library(&self) {
        self.state.lock().record("destroy_library");
    }

    fn last_error(&self) -> u32 {
        let mut state = self.state.lock();
        state.record("last_error");
        state.last_error
    }

    fn load_document(&self, path: &str, _password: Option<&str>) -> DocumentHandle {
        let bytes = std::fs::read(path);
        let mut state = self.state.lock();
        state.record("load_document");
        match bytes {
            Ok(bytes) => state.open_document(&bytes),
            Err(_) => {
                state.last_error = ErrorCode::FILE.0;
                DocumentHandle::NULL
            }
        }
    }

    fn load_mem_document(&self, bytes: &[u8], _password: Option<&str>) -> DocumentHandle {
        let mut state = self.state.lock();
        state.record("load_mem_document");
        state.open_document(bytes)
    }

    fn close_document(&self, document: DocumentHandle) {
        let mut state = self.state.lock();
        state.record("close_document");
        state.documents.remove(&document);
    }

    fn page_count(&self, document: DocumentHandle) -> i32 {
        let mut state = self.state.lock();
        state.record("page_count");
        if state.documents.contains_key(&document) {
            PAGES
        } else {
            0
        }
    }

    fn file_version(&self, document: DocumentHandle) -> Option<i32> {
        let mut state = self.state.lock();
        state.record("file_version");
        state.documents.contains_key(&document).then_some(17)
    }

    fn doc_permissions(&self, _document: DocumentHandle) -> u64 {
        self.state.lock().record("doc_permissions");
        Self::PERMISSIONS
    }

    fn load_page(&self, document: DocumentHandle, index: i32) -> PageHandle {
        let mut state = self.state.lock();
        state.record("load_page");
        if !state.documents.contains_key(&document) || !(0..PAGES).contains(&index) {
            state.last_error = ErrorCode::PAGE.0;
            return PageHandle::NULL;
        }
        let page = PageHandle::from_raw(state.next());
        state.pages.insert(page, document);
        page
    }

    fn close_page(&self, page: PageHandle) {
        let mut state = self.state.lock();
        state.record("close_page");
        state.pages.remove(&page);
    }

    fn page_width(&self, _page: PageHandle) -> f64 {
        self.state.lock().record("page_width");
        PAGE_WIDTH
    }

    fn page_height(&self, _page: PageHandle) -> f64 {
        self.state.lock().record("page_height");
        PAGE_HEIGHT
    }

    fn page_size_by_index(&self, document: DocumentHandle, index: i32) -> Option<(f64, f64)> {
        let mut state = self.state.lock();
        state.record("page_size_by_index");
        (state.documents.contains_key(&document) && (0..PAGES).contains(&index))
            .then_some((PAGE_WIDTH, PAGE_HEIGHT))
    }

    fn bitmap_create(&self, width: i32, height: i32, alpha: bool) -> BitmapHandle {
        let format = if alpha {
            BitmapFormat::BGRA
        } else {
            BitmapFormat::BGRX
        };
        self.create("bitmap_create", width, height, format)
    }

    fn bitmap_create_ex(&self, width: i32, height: i32, format: i32) -> BitmapHandle {
        self.create("bitmap_create_ex", width, height, BitmapFormat(format))
    }

    fn bitmap_destroy(&self, bitmap: BitmapHandle) {
        let mut state = self.state.lock();
        state.record("bitmap_destroy");
        state.bitmaps.remove(&bitmap);
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
        let mut state = self.state.lock();
        state.record("bitmap_fill_rect");
        let Some(target) = state.bitmaps.get_mut(&bitmap) else {
            return false;
        };
        let Some(bpp) = target.format.bytes_per_pixel() else {
            return false;
        };

        let [b, g, r, a] = color.to_le_bytes();
        let pixel: Vec<u8> = match target.format {
            BitmapFormat::GRAY => vec![((r as u32 + g as u32 + b as u32) / 3) as u8],
            BitmapFormat::BGR => vec![b, g, r],
            BitmapFormat::BGRX => vec![b, g, r, 0xFF],
            _ => vec![b, g, r, a],
        };

        let x0 = left.clamp(0, target.width);
        let x1 = (left + width).clamp(0, target.width);
        let y0 = top.clamp(0, target.height);
        let y1 = (top + height).clamp(0, target.height);
        for y in y0..y1 {
            for x in x0..x1 {
                let at = (y * target.stride) as usize + x as usize * bpp;
                target.pixels[at..at + bpp].copy_from_slice(&pixel);
            }
        }
        true
    }

    fn bitmap_buffer(&self, bitmap: BitmapHandle) -> *mut u8 {
        let mut state = self.state.lock();
        state.record("bitmap_buffer");
        state
            .bitmaps
            .get_mut(&bitmap)
            .map(|b| b.pixels.as_mut_ptr())
            .unwrap_or(std::ptr::null_mut())
    }

    fn bitmap_width(&self, bitmap: BitmapHandle) -> i32 {
        self.bitmap_field("bitmap_width", bitmap, |b| b.width)
    }

    fn bitmap_height(&self, bitmap: BitmapHandle) -> i32 {
        self.bitmap_field("bitmap_height", bitmap, |b| b.height)
    }

    fn bitmap_stride(&self, bitmap: BitmapHandle) -> i32 {
        self.bitmap_field("bitmap_stride", bitmap, |b| b.stride)
    }

    fn bitmap_format(&self, bitmap: BitmapHandle) -> i32 {
        self.bitmap_field("bitmap_format", bitmap, |b| b.format.0)
    }

    fn render_page_bitmap(
        &self,
        _bitmap: BitmapHandle,
        _page: PageHandle,
        _viewport: Viewport,
        _rotate: i32,
        _flags: i32,
    ) {
        self.state.lock().record("render_page_bitmap");
    }

    // Only the unrotated mapping is modelled: y grows downwards on the device.
    fn device_to_page(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        device_x: i32,
        device_y: i32,
    ) -> Option<(f64, f64)> {
        let mut state = self.state.lock();
        state.record("device_to_page");
        if rotate != 0 || !state.pages.contains_key(&page) {
            return None;
        }
        let (sx, sy) = scale(viewport);
        let x = (device_x - viewport.start_x) as f64 / sx;
        let y = PAGE_HEIGHT - (device_y - viewport.start_y) as f64 / sy;
        Some((x, y))
    }

    fn page_to_device(
        &self,
        page: PageHandle,
        viewport: Viewport,
        rotate: i32,
        page_x: f64,
        page_y: f64,
    ) -> Option<(i32, i32)> {
        let mut state = self.state.lock();
        state.record("page_to_device");
        if rotate != 0 || !state.pages.contains_key(&page) {
            return None;
        }
        let (sx, sy) = scale(viewport);
        let x = viewport.start_x + (page_x * sx).round() as i32;
        let y = viewport.start_y + ((PAGE_HEIGHT - page_y) * sy).round() as i32;
        Some((x, y))
    }
}

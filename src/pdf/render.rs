//! Page rendering built from the binding calls, used by the command-line tool.

use crate::pdf::error::BindingError;
use crate::pdf::handle::{DocumentHandle, PageHandle};
use crate::pdf::library::Library;
use crate::pdf::types::{RenderFlags, Rotation, Viewport};

/// Opaque white in `0xAARRGGBB`.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Render a page at `target_width` pixels wide to PNG bytes.
///
/// Height follows the page's aspect ratio. The page is drawn over an
/// opaque white background with annotations and LCD text enabled.
pub fn render_page_to_png(
    library: &Library,
    document: DocumentHandle,
    page_index: i32,
    target_width: i32,
) -> Result<Vec<u8>, BindingError> {
    if target_width <= 0 {
        return Err(BindingError::Usage(format!(
            "Render width must be positive, got {}",
            target_width
        )));
    }

    let page = library.load_page(document, page_index);
    if page.is_null() {
        return Err(BindingError::Render(format!(
            "Failed to load page {}: {}",
            page_index,
            library.last_error()
        )));
    }

    let result = render_loaded_page(library, page, target_width);
    library.close_page(page);
    result
}

fn render_loaded_page(
    library: &Library,
    page: PageHandle,
    target_width: i32,
) -> Result<Vec<u8>, BindingError> {
    let page_width = library.page_width(page);
    let page_height = library.page_height(page);
    if page_width <= 0.0 || page_height <= 0.0 {
        return Err(BindingError::Render(format!(
            "Page has no area ({}x{})",
            page_width, page_height
        )));
    }

    let scale = target_width as f64 / page_width;
    let target_height = ((page_height * scale) as i32).max(1);

    let bitmap = library.create_bitmap(target_width, target_height, true);
    if bitmap.is_null() {
        return Err(BindingError::Render(format!(
            "Failed to create {}x{} bitmap",
            target_width, target_height
        )));
    }

    library.fill_rect(bitmap, 0, 0, target_width, target_height, WHITE);
    library.render_page_bitmap(
        bitmap,
        page,
        Viewport::sized(target_width, target_height),
        Rotation::NONE,
        RenderFlags::ANNOT | RenderFlags::LCD_TEXT,
    );
    tracing::debug!("Rendered page at {}x{}", target_width, target_height);

    // SAFETY: the bitmap is alive and this is its only view.
    let png = match unsafe { library.bitmap_buffer(bitmap) } {
        Some(view) => view.encode_png(),
        None => Err(BindingError::Render("Bitmap has no pixel buffer".to_string())),
    };
    library.destroy_bitmap(bitmap);
    png
}

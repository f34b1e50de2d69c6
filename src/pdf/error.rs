use serde::Serialize;
use thiserror::Error;

/// Errors from setting up the bindings and from the helpers built on them.
///
/// Binding entry points never return these: they report failure through
/// sentinel values and [`crate::pdf::Library::last_error`].
#[derive(Error, Debug)]
pub enum BindingError {
    #[error("Failed to bind PDFium: {0}")]
    Bind(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Image encoding failed: {0}")]
    Image(String),

    #[error("{0}")]
    Usage(String),
}

impl Serialize for BindingError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

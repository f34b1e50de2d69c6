//! Opaque handles for resources owned by PDFium.
//!
//! Each handle is a newtype around the native pointer's address, widened to
//! `u64` so it can travel through a managed runtime as a plain long. Zero is
//! the null handle everywhere. Nothing here tracks liveness: using a handle
//! after it was closed or destroyed is undefined behaviour inherited from
//! PDFium.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u64);

        impl $name {
            /// The null (absent) handle.
            pub const NULL: Self = Self(0);

            /// Wrap a raw handle value received from a caller.
            #[inline]
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The raw handle value to hand back to a caller.
            #[inline]
            pub const fn into_raw(self) -> u64 {
                self.0
            }

            /// Check if this handle is the null handle.
            #[inline]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }

            #[inline]
            pub(crate) fn from_ptr<T>(ptr: *mut T) -> Self {
                Self(ptr as usize as u64)
            }

            #[inline]
            pub(crate) fn as_ptr<T>(self) -> *mut T {
                self.0 as usize as *mut T
            }
        }
    };
}

define_handle!(
    /// An opened PDF document.
    DocumentHandle
);

define_handle!(
    /// A loaded page. Must be closed before its document.
    PageHandle
);

define_handle!(
    /// An in-memory raster target.
    BitmapHandle
);

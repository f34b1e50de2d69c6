//! Configuration for locating PDFium and for logging.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_LOG_FILTER: &str = "pdfium_bridge_lib=info";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Full path to the PDFium shared library. Tried first.
    pub library_path: Option<PathBuf>,
    /// Directory holding the platform's PDFium library (`libpdfium.so`, `pdfium.dll`, ...).
    pub library_dir: Option<PathBuf>,
    /// `tracing` filter directive used when this crate installs a subscriber.
    pub log_filter: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        BindingConfig {
            library_path: None,
            library_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BindingConfig {
    /// Read `PDFIUM_LIB_PATH`, `PDFIUM_LIB_DIR` and `PDFIUM_BRIDGE_LOG`.
    /// Unset or empty variables fall back to the defaults.
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            env::var(name).ok().filter(|value| !value.trim().is_empty())
        }

        BindingConfig {
            library_path: var("PDFIUM_LIB_PATH").map(PathBuf::from),
            library_dir: var("PDFIUM_LIB_DIR").map(PathBuf::from),
            log_filter: var("PDFIUM_BRIDGE_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(dir.into());
        self
    }
}

/// Install a `tracing` subscriber filtered by `config.log_filter`.
///
/// `RUST_LOG` wins when set. Does nothing if the host already installed a
/// global subscriber.
pub fn init_logging(config: &BindingConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter.as_str().into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BindingConfig::default();
        assert!(config.library_path.is_none());
        assert!(config.library_dir.is_none());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_builder_methods() {
        let config = BindingConfig::default()
            .with_library_dir("/opt/pdfium/lib")
            .with_library_path("/opt/pdfium/lib/libpdfium.so");
        assert_eq!(config.library_dir, Some(PathBuf::from("/opt/pdfium/lib")));
        assert_eq!(
            config.library_path,
            Some(PathBuf::from("/opt/pdfium/lib/libpdfium.so"))
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let config: BindingConfig =
            serde_json::from_str(r#"{ "library_dir": "/usr/local/lib" }"#).unwrap();
        assert_eq!(config.library_dir, Some(PathBuf::from("/usr/local/lib")));
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}

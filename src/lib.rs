// PDFium Bridge - pass-through bindings for managed runtimes
//
// The library exposes PDFium's C API one call at a time, both as a Rust
// API (`pdf::Library`) and as a C ABI (`ffi`). The binary renders a single
// page to PNG using the same calls.

pub mod config;
pub mod ffi;
pub mod pdf;

use config::BindingConfig;
use pdf::{render_page_to_png, BindingError, Library};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const USAGE: &str = "usage: pdfium-bridge <file.pdf | file://url> [--page N] [--width W] \
                     [--password P] [--output FILE] [--info]";

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub input: String,
    pub page: i32,
    pub width: i32,
    pub password: Option<String>,
    pub output: Option<PathBuf>,
    pub info: bool,
}

/// Check if a path is a valid PDF file.
fn is_pdf_file(path: &str) -> bool {
    let path = Path::new(path);
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}

/// Resolve a PDF argument given as a plain path, a file:// URL or a URL-encoded path.
fn resolve_pdf_path(arg: &str) -> Option<String> {
    if is_pdf_file(arg) {
        return Some(arg.to_string());
    }

    // Handle file:// URLs (macOS sometimes passes these)
    if arg.starts_with("file://") {
        if let Ok(url) = url::Url::parse(arg) {
            if let Ok(path) = url.to_file_path() {
                if let Some(path_str) = path.to_str() {
                    if is_pdf_file(path_str) {
                        return Some(path_str.to_string());
                    }
                }
            }
        }
    }

    // Handle URL-encoded paths (e.g., spaces as %20)
    if let Ok(decoded) = urlencoding::decode(arg) {
        if decoded != arg && is_pdf_file(&decoded) {
            return Some(decoded.into_owned());
        }
    }

    None
}

fn parse_number(flag: &str, value: Option<String>) -> Result<i32, BindingError> {
    let value = value.ok_or_else(|| BindingError::Usage(format!("{} needs a value", flag)))?;
    value
        .parse()
        .map_err(|_| BindingError::Usage(format!("{} expects a number, got {:?}", flag, value)))
}

/// Parse arguments (without the program name).
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, BindingError> {
    let mut args = args.into_iter();
    let mut input = None;
    let mut options = Options {
        input: String::new(),
        page: 0,
        width: 800,
        password: None,
        output: None,
        info: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--page" => options.page = parse_number("--page", args.next())?,
            "--width" => options.width = parse_number("--width", args.next())?,
            "--password" => {
                options.password = Some(
                    args.next()
                        .ok_or_else(|| BindingError::Usage("--password needs a value".to_string()))?,
                );
            }
            "--output" => {
                options.output = Some(PathBuf::from(
                    args.next()
                        .ok_or_else(|| BindingError::Usage("--output needs a value".to_string()))?,
                ));
            }
            "--info" => options.info = true,
            flag if flag.starts_with("--") => {
                return Err(BindingError::Usage(format!("unknown option {}", flag)));
            }
            _ if input.is_none() => input = Some(arg),
            _ => return Err(BindingError::Usage(format!("unexpected argument {}", arg))),
        }
    }

    let input = input.ok_or_else(|| BindingError::Usage(USAGE.to_string()))?;
    options.input = resolve_pdf_path(&input).unwrap_or(input);
    Ok(options)
}

fn execute(library: &Library, options: &Options) -> Result<(), BindingError> {
    let document = library.load_document(&options.input, options.password.as_deref());
    if document.is_null() {
        return Err(BindingError::Render(format!(
            "Failed to load {}: {}",
            options.input,
            library.last_error()
        )));
    }
    tracing::info!(
        "Loaded {} ({} pages)",
        options.input,
        library.page_count(document)
    );

    let result = if options.info {
        library
            .document_info(document)
            .ok_or_else(|| BindingError::Render("No document info".to_string()))
            .and_then(|info| {
                serde_json::to_string_pretty(&info)
                    .map_err(|e| BindingError::Render(e.to_string()))
            })
            .map(|json| println!("{}", json))
    } else {
        render_page_to_png(library, document, options.page, options.width).and_then(|png| {
            let output = options
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("page-{}.png", options.page)));
            std::fs::write(&output, png)?;
            tracing::info!("Page {} written to {:?}", options.page, output);
            Ok(())
        })
    };

    library.close_document(document);
    result
}

/// Entry point of the `pdfium-bridge` binary.
pub fn run() -> ExitCode {
    dotenvy::dotenv().ok();
    let config = BindingConfig::from_env();
    config::init_logging(&config);

    let options = match parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    let library = match Library::load(&config) {
        Ok(library) => library,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let result = execute(&library, &options);
    library.destroy();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::RecordingEngine;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults() {
        let options = parse_args(args(&["missing.pdf"])).unwrap();
        assert_eq!(options.input, "missing.pdf");
        assert_eq!(options.page, 0);
        assert_eq!(options.width, 800);
        assert!(options.password.is_none());
        assert!(!options.info);
    }

    #[test]
    fn test_parse_all_options() {
        let options = parse_args(args(&[
            "--page", "3", "doc.pdf", "--width", "1200", "--password", "secret", "--output",
            "out.png", "--info",
        ]))
        .unwrap();
        assert_eq!(options.page, 3);
        assert_eq!(options.width, 1200);
        assert_eq!(options.password.as_deref(), Some("secret"));
        assert_eq!(options.output, Some(PathBuf::from("out.png")));
        assert!(options.info);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_args(args(&[])), Err(BindingError::Usage(_))));
        assert!(matches!(
            parse_args(args(&["a.pdf", "--page", "x"])),
            Err(BindingError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["a.pdf", "--width"])),
            Err(BindingError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["a.pdf", "b.pdf"])),
            Err(BindingError::Usage(_))
        ));
        assert!(matches!(
            parse_args(args(&["a.pdf", "--zoom", "2"])),
            Err(BindingError::Usage(_))
        ));
    }

    #[test]
    fn test_resolve_file_url_and_encoded_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my doc.pdf");
        std::fs::write(&path, RecordingEngine::sample_document()).unwrap();
        let path_str = path.to_str().unwrap();

        assert_eq!(resolve_pdf_path(path_str).as_deref(), Some(path_str));

        let url = url::Url::from_file_path(&path).unwrap();
        assert_eq!(resolve_pdf_path(url.as_str()).as_deref(), Some(path_str));

        let encoded = path_str.replace(' ', "%20");
        assert_eq!(resolve_pdf_path(&encoded).as_deref(), Some(path_str));

        assert!(resolve_pdf_path("/no/such/file.pdf").is_none());
    }

    #[test]
    fn test_execute_renders_png() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.png");
        std::fs::write(&input, RecordingEngine::sample_document()).unwrap();

        let library = Library::with_engine(Box::new(RecordingEngine::default()));
        let options = Options {
            input: input.to_str().unwrap().to_string(),
            page: 1,
            width: 50,
            password: None,
            output: Some(output.clone()),
            info: false,
        };
        execute(&library, &options).unwrap();

        let image = image::open(&output).unwrap();
        assert_eq!(image.width(), 50);
    }

    #[test]
    fn test_execute_reports_load_error() {
        let library = Library::with_engine(Box::new(RecordingEngine::default()));
        let options = parse_args(args(&["/no/such/file.pdf"])).unwrap();
        let err = execute(&library, &options).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}

use std::process::ExitCode;

fn main() -> ExitCode {
    pdfium_bridge_lib::run()
}

//! Command-line runner for the backend import guardrails.
//!
//! Usage: `architecture-lint [backend-dir]`. Without an argument the backend
//! is located relative to this tool inside the workspace.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn backend_dir() -> PathBuf {
    std::env::args_os().nth(1).map_or_else(
        || {
            PathBuf::from(env!("CARGO_MANIFEST_DIR"))
                .join("..")
                .join("..")
                .join("backend")
        },
        PathBuf::from,
    )
}

fn main() -> ExitCode {
    let backend = backend_dir();
    if !backend.join("src").is_dir() {
        let _ = writeln!(
            io::stderr().lock(),
            "{} has no src directory; pass the backend directory explicitly",
            backend.display()
        );
        return ExitCode::from(2);
    }

    match architecture_lint::lint_backend_sources(&backend) {
        Ok(()) => {
            let _ = writeln!(io::stdout().lock(), "layer boundaries hold");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = write!(io::stderr().lock(), "{err}");
            ExitCode::FAILURE
        }
    }
}

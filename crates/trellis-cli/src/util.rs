//! Shared helpers for loading input off the filesystem or stdin.

use std::io::Read;
use std::path::Path;

use trellis_core::{raw, Program};

/// Read `path`'s contents, or stdin if `path` is `-`.
pub fn read_input(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

/// Parse and resolve an IR document from JSON text.
pub fn load_program(json: &str) -> Result<Program, String> {
    let document = raw::parse_document(json).map_err(|e| format!("malformed IR document: {e}"))?;
    raw::load(&document).map_err(|e| format!("invalid IR document: {e}"))
}

/// Initialize `tracing-subscriber` at debug (with `-v`) or info level,
/// writing to stderr so stdout stays free for the transformed IR document.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

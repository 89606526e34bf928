//! Tracing/logging setup shared by gestio binaries.

pub mod logging;

pub use logging::LogFormat;

/// Initialize process-wide logging with the format chosen by `GESTIO_LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var("GESTIO_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    logging::init(format);
}

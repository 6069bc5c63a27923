//! Tracing and logging (shared setup).

pub use self::tracing::{ENV_LOG_FORMAT, LogFormat};

/// Initialize process-wide tracing using `RUST_LOG` and `GALLEY_LOG_FORMAT`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output format).
pub mod tracing;

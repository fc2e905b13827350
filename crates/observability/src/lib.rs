//! Process-wide tracing setup shared by the binaries and black-box tests.

/// Initialize tracing with the defaults (JSON, `RUST_LOG`, else `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init_with(&tracing::TracingConfig::default());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, TracingConfig};

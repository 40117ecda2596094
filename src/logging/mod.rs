//! Structured logging for the loader, differential codec, and extension
//! subsystems.
//!
//! Logging is purely observational: no event emitted here ever changes
//! control flow in the loaders, serializer, or activation engine.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging with default configuration.
///
/// Targets stderr, environment-based level filtering.
pub fn init_logging() {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("lef=debug".parse().unwrap())
        .add_directive("info".parse().unwrap());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("logging initialized");
}

/// Initialize logging for tests with verbose output, captured by the test
/// harness rather than written to stderr directly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

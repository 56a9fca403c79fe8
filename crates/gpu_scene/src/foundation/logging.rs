//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace, LevelFilter};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level that `RUST_LOG` can still override.
///
/// Returns `false` when a logger was already installed.
pub fn init_with_level(level: LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

/// Install a test-friendly logger; repeated calls are harmless
pub fn try_init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}

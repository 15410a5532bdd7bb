use std::io;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::constants::{DEFAULT_LOG_LEVEL, VERBOSE_LOG_LEVEL};

/// Filter used when `RUST_LOG` is unset
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_LEVEL
    } else {
        DEFAULT_LOG_LEVEL
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used.
pub fn init_logger(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // try_init so a second call (tests, embedding) is harmless
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr) // Keep stdout for chat output
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .try_init();
}

/// Log an info message with a tag prefix
pub fn log_info(tag: &str, message: impl std::fmt::Display) {
    info!("{} {}", tag, message);
}

/// Log a warning message with a tag prefix
pub fn log_warn(tag: &str, message: impl std::fmt::Display) {
    warn!("{} {}", tag, message);
}

/// Log an error message with a tag prefix
pub fn log_error(tag: &str, message: impl std::fmt::Display) {
    error!("{} {}", tag, message);
}

/// Log a debug message
pub fn log_debug(message: impl std::fmt::Display) {
    debug!("{}", message);
}

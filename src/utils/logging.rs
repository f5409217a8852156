//! Conditional logging macros gated on the runtime `logging_enabled` flag.
//!
//! The flag is set once from [`TrackerConfig`](crate::config::TrackerConfig)
//! at client construction; until then logging defaults to off so an embedded
//! host never sees SDK output it did not ask for.

use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(false);

pub fn set_logging_enabled(enabled: bool) {
    LOGGING_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn logging_enabled() -> bool {
    LOGGING_ENABLED.load(Ordering::Relaxed)
}

/// Macro for conditional info logging.
#[macro_export]
macro_rules! sdk_info {
    ($($arg:tt)*) => {
        if $crate::utils::logging::logging_enabled() {
            log::info!($($arg)*);
        }
    };
}

/// Macro for conditional warn logging.
#[macro_export]
macro_rules! sdk_warn {
    ($($arg:tt)*) => {
        if $crate::utils::logging::logging_enabled() {
            log::warn!($($arg)*);
        }
    };
}

/// Macro for conditional error logging.
#[macro_export]
macro_rules! sdk_error {
    ($($arg:tt)*) => {
        if $crate::utils::logging::logging_enabled() {
            log::error!($($arg)*);
        }
    };
}

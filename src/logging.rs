//! Logging abstraction layer
//!
//! Logging macros that forward to either the `log` or the `tracing` crate.
//!
//! # Features
//!
//! - `log` (default) - Uses the standard `log` crate
//! - `tracing` - Uses the `tracing` crate for structured logging
//!
//! Choose one feature at compile time. They are mutually exclusive. With
//! neither enabled the macros compile to nothing.
//!
//! # Usage
//!
//! ```ignore
//! use history_router::{debug_log, info_log, trace_log};
//!
//! trace_log!("Relaying popstate");
//! debug_log!("Running route: {} {}", method, path);
//! info_log!("Router started");
//! ```

/// Trace-level logging
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
    };
}

/// Debug-level logging
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
    };
}

/// Info-level logging
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
    };
}

/// Warn-level logging
///
/// Used for routes that were not found and undecodable history state.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
    };
}

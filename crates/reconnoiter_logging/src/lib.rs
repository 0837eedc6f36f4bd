#![deny(missing_docs)]
//! Shared logging utilities for the reconnoiter workspace.
//!
//! This crate provides the `recon_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger.
//!
//! Every macro accepts an optional `session = <expr>;` prefix that tags the
//! line with the tracked session:
//!
//! ```
//! use reconnoiter_logging::recon_info;
//! let session = "abc";
//! recon_info!(session = session; "falling back to polling");
//! recon_info!("no session yet");
//! ```

/// Formats the tag placed in front of session-scoped log lines.
#[doc(hidden)]
pub fn session_tag(session: &dyn std::fmt::Display) -> String {
    format!("[session {session}]")
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! recon_trace {
    (session = $session:expr; $($arg:tt)*) => {{
        log::trace!("{} {}", $crate::session_tag(&$session), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! recon_debug {
    (session = $session:expr; $($arg:tt)*) => {{
        log::debug!("{} {}", $crate::session_tag(&$session), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! recon_info {
    (session = $session:expr; $($arg:tt)*) => {{
        log::info!("{} {}", $crate::session_tag(&$session), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! recon_warn {
    (session = $session:expr; $($arg:tt)*) => {{
        log::warn!("{} {}", $crate::session_tag(&$session), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! recon_error {
    (session = $session:expr; $($arg:tt)*) => {{
        log::error!("{} {}", $crate::session_tag(&$session), format_args!($($arg)*));
    }};
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

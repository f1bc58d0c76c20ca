#![deny(missing_docs)]
//! Shared logging utilities for the outreach workspace.
//!
//! This crate provides the `outreach_*` logging macros used across the codebase,
//! a per-thread session context that the macros prefix onto every message, and
//! a minimal test initializer for the global logger.

use std::cell::Cell;
use std::fmt;

#[doc(hidden)]
pub use log as __log;

thread_local! {
    /// Session id the current thread is working on behalf of, if any.
    static SESSION: Cell<Option<u64>> = const { Cell::new(None) };
}

/// Sets the session context for the current thread.
///
/// Prefer [`SessionContextGuard`] in code that may return early.
pub fn set_session_context(session_id: Option<u64>) {
    SESSION.with(|v| v.set(session_id));
}

/// Returns the session context of the current thread.
pub fn session_context() -> Option<u64> {
    SESSION.with(|v| v.get())
}

/// Scoped session context: sets the id on creation and restores the
/// previous value when dropped.
pub struct SessionContextGuard {
    previous: Option<u64>,
}

impl SessionContextGuard {
    /// Enters the context of `session_id` on the current thread.
    pub fn enter(session_id: u64) -> Self {
        let previous = session_context();
        set_session_context(Some(session_id));
        Self { previous }
    }
}

impl Drop for SessionContextGuard {
    fn drop(&mut self) {
        set_session_context(self.previous);
    }
}

/// Display adapter for the `[session N] ` message prefix.
#[doc(hidden)]
pub struct SessionPrefix(Option<u64>);

impl fmt::Display for SessionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(id) => write!(f, "[session {id}] "),
            None => Ok(()),
        }
    }
}

#[doc(hidden)]
pub fn session_prefix() -> SessionPrefix {
    SessionPrefix(session_context())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! outreach_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}{}", $crate::session_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! outreach_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}{}", $crate::session_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! outreach_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}{}", $crate::session_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! outreach_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}{}", $crate::session_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! outreach_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}{}", $crate::session_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
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

#![deny(missing_docs)]
//! Shared logging utilities for the listen client workspace.
//!
//! This crate provides the `listen_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Every line is tagged
//! with the sequence number of the user/server event currently being handled,
//! so log output from one dispatch can be grouped.

use std::cell::Cell;

thread_local! {
    /// Thread-local storage for the sequence number of the event in flight.
    static EVENT_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Sets the event sequence number for the current thread.
/// The app's dispatch loop calls this once per message.
pub fn set_event_seq(seq: u64) {
    EVENT_SEQ.with(|v| v.set(seq));
}

/// Retrieves the event sequence number for the current thread.
/// Returns 0 outside of a dispatch.
pub fn event_seq() -> u64 {
    EVENT_SEQ.with(|v| v.get())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! listen_trace {
    ($($arg:tt)*) => {{
        log::trace!("[ev {}] {}", $crate::event_seq(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! listen_info {
    ($($arg:tt)*) => {{
        log::info!("[ev {}] {}", $crate::event_seq(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! listen_debug {
    ($($arg:tt)*) => {{
        log::debug!("[ev {}] {}", $crate::event_seq(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! listen_warn {
    ($($arg:tt)*) => {{
        log::warn!("[ev {}] {}", $crate::event_seq(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! listen_error {
    ($($arg:tt)*) => {{
        log::error!("[ev {}] {}", $crate::event_seq(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test binary thread may have won the race.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_seq_is_per_thread() {
        set_event_seq(7);
        assert_eq!(event_seq(), 7);
        let other = std::thread::spawn(event_seq).join().unwrap();
        assert_eq!(other, 0);
    }

    #[test]
    fn macros_expand_without_a_logger() {
        listen_debug!("value={}", 3);
        listen_warn!("plain");
    }
}

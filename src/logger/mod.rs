//! Structured logging system for the MK OHLCV bot
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<tag> flags
//! - Dual output: colored console + per-run log file
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mk_ohlcv_bot::logger::{self, LogTag};
//!
//! logger::error(LogTag::Storage, "Failed to write whitelist");
//! logger::warning(LogTag::Referral, "Malformed TTL, link will be unbounded");
//! logger::info(LogTag::Access, "User added to whitelist");
//! logger::debug(LogTag::Api, "Request details: ..."); // Only if --debug-api
//! ```
//!
//! ## Initialization
//!
//! Call once at startup, after the logs directory exists:
//! ```rust,ignore
//! logger::init();
//! ```
//!
//! Logging before `init()` (for example from unit tests) still works: the
//! default configuration is used and nothing is written to disk.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod special;
mod tags;

pub use config::{get_logger_config, init_from_args, set_logger_config, LoggerConfig};
pub use file::current_log_file;
pub use levels::LogLevel;
pub use special::log_price_change;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Parses debug flags from the command line and opens the log file for this run.
pub fn init() {
    config::init_from_args();
    file::init_file_logging();
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level
///
/// Warnings are shown by default (unless --quiet is used).
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the matching --debug-<tag> flag is present.
///
/// # Example
/// ```rust,ignore
/// // Only shown with --debug-referral
/// logger::debug(LogTag::Referral, "Sweep dropped 2 codes");
/// ```
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Force flush all pending log writes
///
/// Call this during shutdown to ensure all logs are written to disk.
pub fn flush() {
    file::flush_file_logging();
}

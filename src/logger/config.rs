//! Logger configuration derived from command-line flags

use super::levels::LogLevel;
use super::tags::LogTag;
use crate::arguments;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::RwLock;

/// Runtime logger configuration
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Messages above this level are dropped
    pub min_level: LogLevel,
    /// Tags whose debug output is enabled (by debug key)
    pub debug_tags: HashSet<String>,
    /// When non-empty, only these tags are logged (errors always pass)
    pub enabled_tags: HashSet<String>,
    /// Write to the log file in addition to the console
    pub file_logging: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            debug_tags: HashSet::new(),
            enabled_tags: HashSet::new(),
            file_logging: true,
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

/// Snapshot of the current logger configuration
pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_default()
}

/// Replace the logger configuration
pub fn set_logger_config(config: LoggerConfig) {
    if let Ok(mut guard) = LOGGER_CONFIG.write() {
        *guard = config;
    }
}

/// Build the configuration from command-line flags
///
/// Recognized flags:
/// - `--verbose`: everything, including verbose traces
/// - `--quiet`: errors only
/// - `--debug-<tag>`: debug output for one tag
/// - `--debug-all`: debug output for every tag
/// - `--no-log-file`: console only
pub fn init_from_args() {
    let mut config = LoggerConfig::default();

    if arguments::has_arg("--quiet") {
        config.min_level = LogLevel::Error;
    }

    if arguments::has_arg("--verbose") {
        config.min_level = LogLevel::Verbose;
    }

    let debug_all = arguments::has_arg("--debug-all");
    for tag in LogTag::all() {
        let key = tag.to_debug_key();
        if debug_all || arguments::has_arg(&format!("--debug-{}", key)) {
            config.debug_tags.insert(key);
        }
    }

    if !config.debug_tags.is_empty() && config.min_level < LogLevel::Debug {
        config.min_level = LogLevel::Debug;
    }

    if arguments::has_arg("--no-log-file") {
        config.file_logging = false;
    }

    set_logger_config(config);
}

pub(super) fn is_debug_enabled_for_tag(tag: &LogTag) -> bool {
    let config = get_logger_config();
    config.min_level == LogLevel::Verbose || config.debug_tags.contains(&tag.to_debug_key())
}

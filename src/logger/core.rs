/// Core logging implementation with filtering
///
/// Decides whether a message is displayed and hands it to the formatter.
use super::config::{get_logger_config, is_debug_enabled_for_tag};
use super::levels::LogLevel;
use super::tags::LogTag;

/// Check if a log message should be displayed
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Messages above the minimum level are dropped
/// 3. Debug requires --debug-<tag> (or --verbose)
/// 4. Verbose requires --verbose
/// 5. If enabled_tags is non-empty, the tag must be in the set
pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let config = get_logger_config();

    if level > config.min_level {
        return false;
    }

    if level == LogLevel::Debug && !is_debug_enabled_for_tag(tag) {
        return false;
    }

    if level == LogLevel::Verbose && config.min_level != LogLevel::Verbose {
        return false;
    }

    if !config.enabled_tags.is_empty() && !config.enabled_tags.contains(&tag.to_debug_key()) {
        return false;
    }

    true
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(tag, level, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_always_logged() {
        assert!(should_log(&LogTag::Storage, LogLevel::Error));
    }

    #[test]
    fn test_debug_hidden_by_default() {
        // Default config has no debug tags enabled
        if get_logger_config().debug_tags.is_empty() {
            assert!(!should_log(&LogTag::Referral, LogLevel::Debug));
        }
    }
}

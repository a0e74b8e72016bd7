//! Log formatting and output with ANSI colors
//!
//! Console lines are colored and aligned; file lines are plain text with a
//! full timestamp.

use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

/// Log format widths for alignment
const TAG_WIDTH: usize = 11;
const LEVEL_WIDTH: usize = 7;

/// Format and output a log message
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string().dimmed();

    let tag_str = format_tag(&tag);
    let level_str = format_level(level);

    for (i, line) in message.lines().enumerate() {
        let console_line = if i == 0 {
            format!("{} [{}] [{}] {}", time, tag_str, level_str, line)
        } else {
            // Continuation lines align under the message column
            format!("{}{}", " ".repeat(8 + TAG_WIDTH + LEVEL_WIDTH + 7), line)
        };
        print_stdout_safe(&console_line);
    }

    let file_line = format!(
        "{} [{}] [{}] {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        tag.to_plain_string(),
        level.as_str(),
        message
    );
    write_to_file(&file_line);
}

/// Format a tag with its color
fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.yellow().bold(),
        LogTag::Storage => label.bright_blue().bold(),
        LogTag::Access => label.bright_magenta().bold(),
        LogTag::Referral => label.bright_green().bold(),
        LogTag::Api => label.bright_cyan().bold(),
        LogTag::Chart => label.cyan().bold(),
        LogTag::Telegram => label.blue().bold(),
        LogTag::Description => label.green().bold(),
        LogTag::Test => label.bright_blue().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

/// Format level with its color
fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.bright_yellow().bold(),
        LogLevel::Info => label.white().bold(),
        LogLevel::Debug => label.magenta(),
        LogLevel::Verbose => label.dimmed(),
    }
}

/// Print to stdout but ignore broken pipe errors
fn print_stdout_safe(message: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", message) {
        if e.kind() == ErrorKind::BrokenPipe {
            return;
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
    let _ = out.flush();
}

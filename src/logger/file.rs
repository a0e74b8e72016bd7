//! Per-run log file
//!
//! A new file named after the start time is created in the logs directory.
//! Writes before `init_file_logging` are silently skipped.

use super::config::get_logger_config;
use crate::paths;
use chrono::Local;
use once_cell::sync::OnceCell;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

struct LogFile {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

static LOG_FILE: OnceCell<LogFile> = OnceCell::new();

/// Open the log file for this run
pub fn init_file_logging() {
    if !get_logger_config().file_logging {
        return;
    }

    let file_name = Local::now().format("%Y-%m-%d_%H-%M-%S.log").to_string();
    let path = paths::get_logs_directory().join(file_name);

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            let _ = LOG_FILE.set(LogFile {
                path,
                writer: Mutex::new(BufWriter::new(file)),
            });
        }
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
        }
    }
}

/// Path of the log file for this run, if file logging is active
pub fn current_log_file() -> Option<PathBuf> {
    LOG_FILE.get().map(|f| f.path.clone())
}

pub fn write_to_file(line: &str) {
    if let Some(log_file) = LOG_FILE.get() {
        if let Ok(mut writer) = log_file.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Errors and warnings are flushed right away so the admin log download is current
            if line.contains("[ERROR]") || line.contains("[WARNING]") {
                let _ = writer.flush();
            }
        }
    }
}

pub fn flush_file_logging() {
    if let Some(log_file) = LOG_FILE.get() {
        if let Ok(mut writer) = log_file.writer.lock() {
            let _ = writer.flush();
        }
    }
}

//! Centralized path resolution
//!
//! All file and directory paths are resolved through this module.
//!
//! ## Directory Structure
//!
//! ```text
//! <base>/
//! ├── data/
//! │   ├── config.toml
//! │   ├── whitelist.json
//! │   ├── banlist.json
//! │   └── referrals.json
//! ├── logs/
//! │   └── <start time>.log
//! └── charts/
//!     └── chart_<uuid>.svg
//! ```
//!
//! The base directory is `--data-dir` when given, otherwise the platform data
//! directory (`$XDG_DATA_HOME/MkOhlcvBot` on Linux).

use crate::arguments;
use once_cell::sync::Lazy;
use std::path::PathBuf;

const APP_DIR: &str = "MkOhlcvBot";

static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
    if let Some(dir) = arguments::get_data_dir_override() {
        return PathBuf::from(dir);
    }

    if let Some(dir) = dirs::data_local_dir() {
        return dir.join(APP_DIR);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(APP_DIR);
    }

    PathBuf::from(APP_DIR)
}

/// Root directory for data, logs and charts
pub fn get_base_directory() -> PathBuf {
    BASE_DIRECTORY.clone()
}

/// Config and record files
pub fn get_data_directory() -> PathBuf {
    BASE_DIRECTORY.join("data")
}

/// Per-run log files
pub fn get_logs_directory() -> PathBuf {
    BASE_DIRECTORY.join("logs")
}

/// Rendered chart files
pub fn get_charts_directory() -> PathBuf {
    BASE_DIRECTORY.join("charts")
}

/// Main configuration file, unless overridden with `--config`
pub fn get_config_path() -> PathBuf {
    match arguments::get_config_path_override() {
        Some(path) => PathBuf::from(path),
        None => get_data_directory().join("config.toml"),
    }
}

/// Resolve a record file name inside the data directory
///
/// Absolute names are returned unchanged.
pub fn get_data_file(file_name: &str) -> PathBuf {
    let candidate = PathBuf::from(file_name);
    if candidate.is_absolute() {
        candidate
    } else {
        get_data_directory().join(candidate)
    }
}

/// Create every directory the bot writes to
///
/// Must run before `logger::init()` since the logger opens a file in `logs/`.
pub fn ensure_all_directories() -> Result<(), String> {
    let dirs_to_create = vec![
        ("base", get_base_directory()),
        ("data", get_data_directory()),
        ("logs", get_logs_directory()),
        ("charts", get_charts_directory()),
    ];

    for (name, dir) in dirs_to_create {
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                format!(
                    "Failed to create {} directory at {}: {}",
                    name,
                    dir.display(),
                    e
                )
            })?;

            eprintln!("Created directory: {}", dir.display());
        }
    }

    Ok(())
}

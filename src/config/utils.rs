use super::schemas::Config;
/// Configuration utilities - loading and access helpers
///
/// The loaded configuration lives in a process-wide `OnceCell<RwLock<Config>>`.
/// Code that reads config before `load_config()` (unit tests, early logging)
/// sees the defaults.
use crate::logger::{self, LogTag};
use crate::paths;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::RwLock;

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Load `config.toml` from the data directory (or `--config`)
///
/// A missing file is not an error: defaults are used and written out so the
/// operator has a template to edit.
pub fn load_config() -> Result<(), String> {
    let path = paths::get_config_path();
    let config = read_config_file(&path)?;

    if !path.exists() {
        match toml::to_string_pretty(&config) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&path, text) {
                    logger::warning(
                        LogTag::Config,
                        &format!("Could not write default config to {}: {}", path.display(), e),
                    );
                } else {
                    logger::info(
                        LogTag::Config,
                        &format!("Wrote default config to {}", path.display()),
                    );
                }
            }
            Err(e) => {
                logger::warning(LogTag::Config, &format!("Failed to serialize defaults: {}", e));
            }
        }
    }

    install_config(config)
}

/// Parse a configuration file, falling back to defaults when it is missing
pub fn read_config_file(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path.display()),
        );
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

    toml::from_str::<Config>(&contents)
        .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))
}

/// Make `config` the process-wide configuration
///
/// Replaces the current value if one is already installed.
pub fn install_config(config: Config) -> Result<(), String> {
    match CONFIG.get() {
        Some(lock) => {
            let mut guard = lock
                .write()
                .map_err(|e| format!("Failed to acquire config write lock: {}", e))?;
            *guard = config;
        }
        None => {
            if let Err(lock) = CONFIG.set(RwLock::new(config)) {
                // Lost an init race; write through the winner
                let value = lock
                    .into_inner()
                    .map_err(|e| format!("Config lock poisoned: {}", e))?;
                return install_config(value);
            }
        }
    }
    Ok(())
}

/// Execute a function with read access to the configuration
///
/// # Example
/// ```ignore
/// let admin_id = with_config(|cfg| cfg.telegram.admin_id);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));
    let guard = lock.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&guard)
}

/// Clone of the whole configuration, for use across await points
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = read_config_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[telegram\nbot_token = ").unwrap();
        let err = read_config_file(&path).unwrap_err();
        assert!(err.contains("Failed to parse"));
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"https://candles.example\"\n").unwrap();
        let config = read_config_file(&path).unwrap();
        assert_eq!(config.api.base_url, "https://candles.example");
        assert_eq!(config.api.history_timeout_secs, 30);
    }
}

/// Centralized argument handling
///
/// Stores the process arguments once and offers flag/value lookups used by
/// the logger, paths and config modules.
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value that follows a flag, supporting `--flag value` and `--flag=value`
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    let prefix = format!("{}=", flag);
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        if let Some(value) = arg.strip_prefix(&prefix) {
            return Some(value.to_string());
        }
    }
    None
}

pub mod patterns {
    use super::has_arg;

    pub fn is_help_requested() -> bool {
        has_arg("--help") || has_arg("-h")
    }
}

/// Config file override (`--config <path>`)
pub fn get_config_path_override() -> Option<String> {
    get_arg_value("--config")
}

/// Data directory override (`--data-dir <path>`)
pub fn get_data_dir_override() -> Option<String> {
    get_arg_value("--data-dir")
}

pub fn print_help() {
    println!("MK OHLCV bot");
    println!();
    println!("USAGE:");
    println!("    mk-ohlcv-bot [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>      Config file (default: <data-dir>/config.toml)");
    println!("    --data-dir <path>    Base directory for data, logs and charts");
    println!("    --quiet              Only log errors");
    println!("    --verbose            Log everything");
    println!("    --no-log-file        Do not write a log file");
    println!("    --debug-<tag>        Debug output for one subsystem:");
    println!("                         system, config, storage, access, referral,");
    println!("                         api, chart, telegram, description");
    println!("    --debug-all          Debug output for every subsystem");
    println!("    -h, --help           Print this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_value_forms() {
        set_cmd_args(vec![
            "mk-ohlcv-bot".to_string(),
            "--config".to_string(),
            "/tmp/a.toml".to_string(),
            "--data-dir=/tmp/data".to_string(),
        ]);
        assert_eq!(get_config_path_override().as_deref(), Some("/tmp/a.toml"));
        assert_eq!(get_data_dir_override().as_deref(), Some("/tmp/data"));
        assert!(!has_arg("--verbose"));
        set_cmd_args(env::args().collect());
    }
}

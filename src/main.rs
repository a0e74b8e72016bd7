use anyhow::{anyhow, Context};
use mk_ohlcv_bot::{
    arguments::{patterns, print_help},
    config,
    logger::{self as logger, LogTag},
    paths,
};

/// Main entry point for the MK OHLCV bot
///
/// Order matters: directories first (the logger writes into `logs/`), then
/// the logger, then configuration.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for help request first (before touching the filesystem)
    if patterns::is_help_requested() {
        print_help();
        return Ok(());
    }

    paths::ensure_all_directories()
        .map_err(|e| anyhow!(e))
        .context("Failed to create required directories")?;

    logger::init();

    if let Err(e) = config::load_config() {
        logger::error(LogTag::Config, &format!("Failed to load configuration: {}", e));
        logger::flush();
        return Err(anyhow!(e).context("Configuration could not be loaded"));
    }

    if let Err(e) = mk_ohlcv_bot::run::run_bot().await {
        logger::error(LogTag::System, &format!("Bot failed: {}", e));
        logger::flush();
        return Err(anyhow!(e));
    }

    Ok(())
}

// Bot lifecycle using ServiceManager

use crate::{
    access::{AccessRegistry, AdminIdentity},
    candles::{ApiAuthStatus, CandleApiClient},
    config::{self, Config},
    description::{DescriptionUpdater, PriceCache},
    logger::{self, LogTag},
    paths,
    referral::ReferralEngine,
    services::ServiceManager,
    telegram::{self, BotContext, BotSettings, DescriptionService, TelegramDescriptionPublisher, TelegramService},
};
use std::sync::Arc;

/// Main bot execution function - builds every component, starts the services
/// and blocks until a shutdown signal arrives
pub async fn run_bot() -> Result<(), String> {
    logger::info(LogTag::System, "MK OHLCV bot starting up...");

    // 1. Ensure all required directories exist (safety backup, already done in main.rs)
    paths::ensure_all_directories()
        .map_err(|e| format!("Failed to create required directories: {}", e))?;

    // 2. Load configuration (if not already loaded by main.rs)
    if !config::is_config_initialized() {
        config::load_config()?;
    }
    let cfg = config::get_config_clone();

    // 3. Access registry and referral engine over the record files
    let admin = AdminIdentity::from_config();
    logger::info(
        LogTag::Access,
        &format!("Administrator: {} (ID: {})", admin.username, admin.id),
    );
    let registry = Arc::new(AccessRegistry::open(
        admin,
        &paths::get_data_file(&cfg.storage.whitelist_file),
        &paths::get_data_file(&cfg.storage.banlist_file),
    ));
    let referrals = Arc::new(ReferralEngine::open(
        &paths::get_data_file(&cfg.storage.referrals_file),
        registry.clone(),
    ));

    // 4. Candle API client; a failed credential check is logged, not fatal
    let api = CandleApiClient::from_config()?;
    log_api_status(&api, api.check_auth().await);

    // 5. Telegram bot (token is validated with getMe)
    let (bot, bot_username) = telegram::connect(&cfg.telegram.bot_token).await?;

    // 6. Shared handler state and the description updater
    let prices = Arc::new(PriceCache::new());
    let ctx = Arc::new(BotContext::new(
        bot.clone(),
        &bot_username,
        registry,
        referrals,
        prices.clone(),
        api.clone(),
        BotSettings::from_config(&cfg),
    ));
    let updater = Arc::new(DescriptionUpdater::new(
        prices,
        api,
        Arc::new(TelegramDescriptionPublisher::new(bot)),
        &cfg.description.timeframe,
    ));

    // 7. Register and start services
    let mut service_manager = ServiceManager::new();
    register_all_services(&mut service_manager, ctx, updater, &cfg);
    service_manager.start_all(&cfg).await?;
    logger::info(LogTag::System, "All services started - bot is running");
    for (name, health) in service_manager.health().await {
        logger::debug(LogTag::System, &format!("Service {}: {:?}", name, health));
    }

    // 8. Wait for shutdown signal
    wait_for_shutdown_signal().await?;

    // 9. Stop all services gracefully
    logger::info(LogTag::System, "Initiating graceful shutdown...");
    service_manager.stop_all().await;

    logger::info(LogTag::System, "MK OHLCV bot shut down successfully");
    logger::flush();

    Ok(())
}

fn register_all_services(
    manager: &mut ServiceManager,
    ctx: Arc<BotContext>,
    updater: Arc<DescriptionUpdater>,
    cfg: &Config,
) {
    logger::info(LogTag::System, "Registering services...");

    manager.register(Box::new(TelegramService::new(ctx)));
    manager.register(Box::new(DescriptionService::from_config(updater, cfg)));

    logger::info(LogTag::System, "All services registered (2 total)");
}

fn log_api_status(api: &CandleApiClient, status: ApiAuthStatus) {
    match status {
        ApiAuthStatus::Ok => logger::info(
            LogTag::Api,
            &format!("Candle API reachable at {}", api.base_url()),
        ),
        ApiAuthStatus::Unauthorized => logger::error(
            LogTag::Api,
            "Candle API rejected the credential (check api.auth_header_value)",
        ),
        ApiAuthStatus::Unavailable(reason) => logger::warning(
            LogTag::Api,
            &format!("Candle API not reachable at startup: {}", reason),
        ),
    }
}

/// Wait for shutdown signal (Ctrl+C, SIGTERM on Unix)
async fn wait_for_shutdown_signal() -> Result<(), String> {
    logger::info(
        LogTag::System,
        "Waiting for shutdown signal (press Ctrl+C twice to force kill)",
    );

    #[cfg(unix)]
    let signal_name = {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint =
            signal(SignalKind::interrupt()).map_err(|e| format!("Failed to bind SIGINT: {}", e))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| format!("Failed to bind SIGTERM: {}", e))?;

        tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        }
    };

    #[cfg(not(unix))]
    let signal_name = {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| format!("Failed to listen for shutdown signal: {}", e))?;
        "CTRL_C"
    };

    logger::warning(
        LogTag::System,
        &format!(
            "Shutdown signal received ({}). Press Ctrl+C again to force kill.",
            signal_name
        ),
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::error(LogTag::System, "Second Ctrl+C detected, forcing immediate exit.");
            logger::flush();
            // 130 is the conventional exit code for SIGINT
            std::process::exit(130);
        }
    });

    Ok(())
}

//! Telegram services for the ServiceManager
//!
//! `TelegramService` runs update polling; `DescriptionService` runs the
//! periodic price refresh that feeds the bot description.

use super::context::BotContext;
use super::polling;
use crate::config::Config;
use crate::description::DescriptionUpdater;
use crate::logger::{self, LogTag};
use crate::services::{Service, ServiceHealth};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub struct TelegramService {
    ctx: Arc<BotContext>,
    running: Arc<AtomicBool>,
}

impl TelegramService {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            ctx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Service for TelegramService {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn priority(&self) -> i32 {
        50
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let ctx = self.ctx.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            polling::run_polling(ctx, shutdown).await;
            running.store(false, Ordering::SeqCst);
        });
        Ok(vec![handle])
    }

    async fn stop(&mut self) -> Result<(), String> {
        logger::info(LogTag::Telegram, "Telegram service stopped");
        Ok(())
    }

    async fn health(&self) -> ServiceHealth {
        if self.running.load(Ordering::SeqCst) {
            ServiceHealth::Healthy
        } else {
            ServiceHealth::Stopped
        }
    }
}

pub struct DescriptionService {
    updater: Arc<DescriptionUpdater>,
    initial_delay: Duration,
    interval: Duration,
}

impl DescriptionService {
    pub fn new(updater: Arc<DescriptionUpdater>, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            updater,
            initial_delay,
            interval: interval.max(Duration::from_secs(1)),
        }
    }

    pub fn from_config(updater: Arc<DescriptionUpdater>, config: &Config) -> Self {
        Self::new(
            updater,
            Duration::from_secs(config.description.initial_delay_secs),
            Duration::from_secs(config.description.interval_secs),
        )
    }
}

#[async_trait]
impl Service for DescriptionService {
    fn name(&self) -> &'static str {
        "description"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn is_enabled(&self, config: &Config) -> bool {
        config.description.enabled
    }

    async fn start(&mut self, shutdown: Arc<Notify>) -> Result<Vec<JoinHandle<()>>, String> {
        let updater = self.updater.clone();
        let (initial_delay, interval) = (self.initial_delay, self.interval);
        let handle = tokio::spawn(async move {
            updater.run(shutdown, initial_delay, interval).await;
        });
        Ok(vec![handle])
    }
}

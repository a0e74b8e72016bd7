//! Shared state handed to every update handler

use super::state::ConversationStore;
use crate::access::{AccessGate, AccessRegistry};
use crate::candles::CandleApiClient;
use crate::chart::ChartSize;
use crate::config::{ChartsConfig, Config};
use crate::description::PriceCache;
use crate::referral::ReferralEngine;
use std::sync::Arc;
use teloxide::Bot;

/// Config values the handlers read on every update
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub faq_url: String,
    pub charts: ChartsConfig,
    /// Candle count requested for date-range queries
    pub default_limit: u32,
    pub max_limit: u32,
}

impl BotSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            faq_url: config.telegram.faq_url.clone(),
            charts: config.charts.clone(),
            default_limit: config.api.default_limit,
            max_limit: config.api.max_limit.max(1),
        }
    }

    pub fn chart_size(&self) -> ChartSize {
        ChartSize {
            width: self.charts.width,
            height: self.charts.height,
        }
    }

    pub fn is_known_symbol(&self, symbol: &str) -> bool {
        self.charts.symbols.iter().any(|s| s == symbol)
    }
}

pub struct BotContext {
    pub bot: Bot,
    /// Without the leading `@`
    pub bot_username: String,
    pub gate: AccessGate,
    pub referrals: Arc<ReferralEngine>,
    pub prices: Arc<PriceCache>,
    pub api: CandleApiClient,
    pub conversations: ConversationStore,
    pub settings: BotSettings,
}

impl BotContext {
    pub fn new(
        bot: Bot,
        bot_username: &str,
        registry: Arc<AccessRegistry>,
        referrals: Arc<ReferralEngine>,
        prices: Arc<PriceCache>,
        api: CandleApiClient,
        settings: BotSettings,
    ) -> Self {
        Self {
            bot,
            bot_username: bot_username.trim_start_matches('@').to_string(),
            gate: AccessGate::new(registry),
            referrals,
            prices,
            api,
            conversations: ConversationStore::new(),
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<AccessRegistry> {
        self.gate.registry()
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.gate.is_admin(user_id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::access::AdminIdentity;
    use crate::clock::{Clock, ManualClock};
    use chrono::{TimeZone, Utc};

    pub const ADMIN_ID: i64 = 1000;

    /// Context over in-memory stores; the bot and API client never connect
    pub fn context() -> (BotContext, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).unwrap()));
        let registry = Arc::new(AccessRegistry::in_memory(AdminIdentity::new(ADMIN_ID, "@boss")));
        let referrals = Arc::new(ReferralEngine::in_memory(
            registry.clone(),
            clock.clone() as Arc<dyn Clock>,
        ));
        let api = CandleApiClient::new("http://127.0.0.1:9", "Authorization", "test").unwrap();
        let ctx = BotContext::new(
            Bot::new("123456:TEST"),
            "@mk_ohlcv_bot",
            registry,
            referrals,
            Arc::new(PriceCache::new()),
            api,
            BotSettings::from_config(&Config::default()),
        );
        (ctx, clock)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[test]
    fn test_bot_username_without_at() {
        let (ctx, _) = context();
        assert_eq!(ctx.bot_username, "mk_ohlcv_bot");
        assert!(ctx.is_admin(ADMIN_ID));
        assert!(!ctx.is_admin(ADMIN_ID + 1));
    }

    #[test]
    fn test_known_symbols_from_config() {
        let (ctx, _) = context();
        assert!(ctx.settings.is_known_symbol("btcusdt"));
        assert!(!ctx.settings.is_known_symbol("foousdt"));
        assert_eq!(ctx.settings.chart_size().width, 1200);
    }
}

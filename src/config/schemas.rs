/// Configuration schemas
///
/// Every section is declared with `config_struct!`, so a missing file, a
/// missing section or a missing key all fall back to the values below.
use crate::config_struct;

// ============================================================================
// TELEGRAM
// ============================================================================

config_struct! {
    /// Bot connection and administrator identity
    pub struct TelegramConfig {
        /// Token from @BotFather; the bot refuses to start without it
        bot_token: String = String::new(),
        /// Numeric id of the administrator (always whitelisted, never bannable)
        admin_id: i64 = 123456789,
        /// Display username stored with the administrator record
        admin_username: String = "@admin_username".to_string(),
        /// Link shown by the FAQ button
        faq_url: String = String::new(),
    }
}

// ============================================================================
// CANDLE API
// ============================================================================

config_struct! {
    /// Upstream candle API
    pub struct ApiConfig {
        base_url: String = "http://127.0.0.1:8000".to_string(),
        /// Header carrying the API credential on every request
        auth_header_name: String = "Authorization".to_string(),
        auth_header_value: String = String::new(),
        auth_timeout_secs: u64 = 10,
        latest_timeout_secs: u64 = 15,
        history_timeout_secs: u64 = 30,
        /// Candle count used when a query gives a date range instead of a limit
        default_limit: u32 = 1000,
        /// Upper bound accepted from users
        max_limit: u32 = 1000,
    }
}

// ============================================================================
// STORAGE
// ============================================================================

config_struct! {
    /// Record file names, relative to the data directory
    pub struct StorageConfig {
        whitelist_file: String = "whitelist.json".to_string(),
        banlist_file: String = "banlist.json".to_string(),
        referrals_file: String = "referrals.json".to_string(),
    }
}

// ============================================================================
// DESCRIPTION UPDATER
// ============================================================================

config_struct! {
    /// Periodic BTC/ETH price refresh for the bot description
    pub struct DescriptionConfig {
        enabled: bool = true,
        interval_secs: u64 = 300,
        initial_delay_secs: u64 = 5,
        /// Candle timeframe used for the latest price
        timeframe: String = "5".to_string(),
    }
}

// ============================================================================
// CHARTS
// ============================================================================

config_struct! {
    /// Chart wizard choices
    pub struct ChartsConfig {
        /// Pairs accepted by the query parser and listed in the symbol browser
        symbols: Vec<String> = default_symbols(),
        /// Pairs offered as quick-chart buttons
        quick_symbols: Vec<String> = vec!["btcusdt".to_string(), "ethusdt".to_string()],
        /// Timeframes offered as quick-chart buttons, in minutes
        quick_timeframes: Vec<String> = ["5", "15", "30", "60", "120"]
            .iter()
            .map(|tf| tf.to_string())
            .collect(),
        /// Candle count for the "latest" quick chart
        quick_latest_limit: u32 = 500,
        /// Symbols per page in the symbol browser
        page_size: usize = 15,
        width: u32 = 1200,
        height: u32 = 600,
    }
}

fn default_symbols() -> Vec<String> {
    let mut symbols: Vec<String> = [
        "btcusdt", "ethusdt", "bnbusdt", "solusdt", "xrpusdt", "adausdt", "dogeusdt",
        "tonusdt", "trxusdt", "dotusdt", "linkusdt", "maticusdt", "ltcusdt", "avaxusdt",
        "atomusdt", "uniusdt", "nearusdt", "aptusdt", "arbusdt", "opusdt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    symbols.sort();
    symbols
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    /// Root configuration, one table per section in `config.toml`
    pub struct Config {
        telegram: TelegramConfig = TelegramConfig::default(),
        api: ApiConfig = ApiConfig::default(),
        storage: StorageConfig = StorageConfig::default(),
        description: DescriptionConfig = DescriptionConfig::default(),
        charts: ChartsConfig = ChartsConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [description]
            interval_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.admin_id, 123456789);
        assert_eq!(config.telegram.admin_username, "@admin_username");
        assert_eq!(config.description.interval_secs, 60);
        assert_eq!(config.description.initial_delay_secs, 5);
        assert_eq!(config.storage.whitelist_file, "whitelist.json");
    }

    #[test]
    fn test_default_symbols_sorted() {
        let symbols = ChartsConfig::default().symbols;
        let mut sorted = symbols.clone();
        sorted.sort();
        assert_eq!(symbols, sorted);
        assert!(symbols.contains(&"btcusdt".to_string()));
    }

    #[test]
    fn test_serialize_roundtrip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }
}

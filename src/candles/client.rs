//! HTTP client for the candle API
//!
//! Endpoints (symbols are lower-cased in the path):
//! - `GET /candles/<symbol>/<tf>?limit&start_ts&end_ts`
//! - `GET /candles/close/<symbol>/<tf>?limit&start_ts&end_ts`
//! - `GET /candles/latest/<symbol>/<tf>`
//!
//! Callers get `None` on any failure; the reason goes to the log.

use super::types::{Candle, CandleQuery, ClosePoint};
use crate::config::with_config;
use crate::logger::{self, LogTag};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "MkOhlcvBot/1.0";

/// Outcome of the startup credential probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthStatus {
    Ok,
    Unauthorized,
    Unavailable(String),
}

#[derive(Debug, Clone, Copy)]
struct Timeouts {
    auth: Duration,
    latest: Duration,
    history: Duration,
}

#[derive(Clone)]
pub struct CandleApiClient {
    client: Client,
    base_url: String,
    auth_header: Option<(String, String)>,
    timeouts: Timeouts,
}

impl CandleApiClient {
    pub fn new(base_url: &str, auth_header_name: &str, auth_header_value: &str) -> Result<Self, String> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        let auth_header = if auth_header_name.trim().is_empty() {
            None
        } else {
            Some((auth_header_name.trim().to_string(), auth_header_value.to_string()))
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            timeouts: Timeouts {
                auth: Duration::from_secs(10),
                latest: Duration::from_secs(15),
                history: Duration::from_secs(30),
            },
        })
    }

    /// Client built from the `[api]` config section
    pub fn from_config() -> Result<Self, String> {
        let api = with_config(|cfg| cfg.api.clone());
        let mut client = Self::new(&api.base_url, &api.auth_header_name, &api.auth_header_value)?;
        client.timeouts = Timeouts {
            auth: Duration::from_secs(api.auth_timeout_secs),
            latest: Duration::from_secs(api.latest_timeout_secs),
            history: Duration::from_secs(api.history_timeout_secs),
        };
        Ok(client)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn candles_url(&self, kind: Option<&str>, symbol: &str, timeframe: &str) -> String {
        match kind {
            Some(kind) => format!(
                "{}/candles/{}/{}/{}",
                self.base_url,
                kind,
                symbol.to_lowercase(),
                timeframe
            ),
            None => format!(
                "{}/candles/{}/{}",
                self.base_url,
                symbol.to_lowercase(),
                timeframe
            ),
        }
    }

    fn request(&self, url: &str, timeout: Duration) -> reqwest::RequestBuilder {
        let builder = self.client.get(url).timeout(timeout);
        match &self.auth_header {
            Some((name, value)) => builder.header(name.as_str(), value.as_str()),
            None => builder,
        }
    }

    /// Probe the API with the configured credential
    pub async fn check_auth(&self) -> ApiAuthStatus {
        let url = self.candles_url(Some("latest"), "btcusdt", "1");
        logger::info(LogTag::Api, &format!("Checking API credentials: {}", url));

        match self.request(&url, self.timeouts.auth).send().await {
            Ok(response) => match response.status() {
                StatusCode::OK => {
                    logger::info(LogTag::Api, "API credentials accepted");
                    ApiAuthStatus::Ok
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    logger::error(
                        LogTag::Api,
                        &format!("API rejected credentials ({})", response.status()),
                    );
                    ApiAuthStatus::Unauthorized
                }
                status => {
                    let body = response.text().await.unwrap_or_default();
                    logger::error(
                        LogTag::Api,
                        &format!("API check failed with status {}: {}", status, body),
                    );
                    ApiAuthStatus::Unavailable(format!("status {}", status))
                }
            },
            Err(e) => {
                logger::error(LogTag::Api, &format!("API unreachable: {}", e));
                ApiAuthStatus::Unavailable(e.to_string())
            }
        }
    }

    /// GET a JSON body, or `None` with a log line
    async fn get_json(
        &self,
        url: &str,
        params: &[(&'static str, String)],
        timeout: Duration,
        label: &str,
    ) -> Option<Value> {
        let started = Instant::now();
        logger::debug(LogTag::Api, &format!("GET {} {:?}", url, params));

        let response = match self.request(url, timeout).query(params).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                logger::error(
                    LogTag::Api,
                    &format!("Timed out after {}s fetching {}", timeout.as_secs(), label),
                );
                return None;
            }
            Err(e) => {
                logger::error(LogTag::Api, &format!("Request for {} failed: {}", label, e));
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNPROCESSABLE_ENTITY {
                logger::error(
                    LogTag::Api,
                    &format!("API validation error for {} {:?}: {}", label, params, body),
                );
            } else {
                logger::error(
                    LogTag::Api,
                    &format!("API returned {} for {}: {}", status, label, body),
                );
            }
            return None;
        }

        match response.json::<Value>().await {
            Ok(body) => {
                logger::debug(
                    LogTag::Api,
                    &format!("{} answered in {:.3}s", label, started.elapsed().as_secs_f64()),
                );
                Some(body)
            }
            Err(e) => {
                logger::error(
                    LogTag::Api,
                    &format!("Malformed JSON body for {}: {}", label, e),
                );
                None
            }
        }
    }

    pub async fn get_candles(&self, symbol: &str, timeframe: &str, query: CandleQuery) -> Option<Vec<Candle>> {
        let url = self.candles_url(None, symbol, timeframe);
        let label = format!("candles {}/{}", symbol, timeframe);
        let body = self
            .get_json(&url, &query.to_params(), self.timeouts.history, &label)
            .await?;
        let candles = parse_candle_list(&body);
        match &candles {
            Some(list) => logger::info(
                LogTag::Api,
                &format!("API returned {} candles for {}/{}", list.len(), symbol, timeframe),
            ),
            None => logger::error(
                LogTag::Api,
                &format!("Expected a list of candles for {}/{}", symbol, timeframe),
            ),
        }
        candles
    }

    pub async fn get_close_prices(
        &self,
        symbol: &str,
        timeframe: &str,
        query: CandleQuery,
    ) -> Option<Vec<ClosePoint>> {
        let url = self.candles_url(Some("close"), symbol, timeframe);
        let label = format!("close prices {}/{}", symbol, timeframe);
        let body = self
            .get_json(&url, &query.to_params(), self.timeouts.history, &label)
            .await?;
        let points = parse_close_list(&body);
        match &points {
            Some(list) => logger::info(
                LogTag::Api,
                &format!("API returned {} close prices for {}/{}", list.len(), symbol, timeframe),
            ),
            None => logger::error(
                LogTag::Api,
                &format!("Expected a list of close prices for {}/{}", symbol, timeframe),
            ),
        }
        points
    }

    pub async fn get_latest_candle(&self, symbol: &str, timeframe: &str) -> Option<Candle> {
        let url = self.candles_url(Some("latest"), symbol, timeframe);
        let label = format!("latest candle {}/{}", symbol, timeframe);
        let body = self.get_json(&url, &[], self.timeouts.latest, &label).await?;
        let candle = parse_latest(&body);
        if candle.is_none() {
            logger::warning(
                LogTag::Api,
                &format!("No latest candle for {}/{}: {}", symbol, timeframe, body),
            );
        }
        candle
    }
}

/// List body; `None` when the body is not an array
pub fn parse_candle_list(body: &Value) -> Option<Vec<Candle>> {
    Some(body.as_array()?.iter().filter_map(Candle::from_json).collect())
}

pub fn parse_close_list(body: &Value) -> Option<Vec<ClosePoint>> {
    Some(body.as_array()?.iter().filter_map(ClosePoint::from_json).collect())
}

/// Single-object body; `null` means no candle yet
pub fn parse_latest(body: &Value) -> Option<Candle> {
    Candle::from_json(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_urls_lowercase_symbol() {
        let client = CandleApiClient::new("http://api.local/", "X-API-Key", "secret").unwrap();
        assert_eq!(client.base_url(), "http://api.local");
        assert_eq!(
            client.candles_url(None, "BTCUSDT", "5"),
            "http://api.local/candles/btcusdt/5"
        );
        assert_eq!(
            client.candles_url(Some("close"), "EthUsdt", "60"),
            "http://api.local/candles/close/ethusdt/60"
        );
        assert_eq!(
            client.candles_url(Some("latest"), "btcusdt", "1"),
            "http://api.local/candles/latest/btcusdt/1"
        );
    }

    #[test]
    fn test_empty_header_name_sends_no_auth() {
        let client = CandleApiClient::new("http://api.local", "", "").unwrap();
        assert!(client.auth_header.is_none());
    }

    #[test]
    fn test_parse_lists() {
        let body = json!([
            {"timestamp": 1, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5, "volume": 10.0},
            {"timestamp": 2, "close": 1.7},
            "garbage"
        ]);
        let candles = parse_candle_list(&body).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].high, 0.0);

        let closes = parse_close_list(&json!([{"timestamp": 5, "close": 3.0}])).unwrap();
        assert_eq!(closes, vec![ClosePoint { timestamp: 5, close: 3.0 }]);

        assert!(parse_candle_list(&json!({"detail": "not a list"})).is_none());
    }

    #[test]
    fn test_parse_latest_null() {
        assert!(parse_latest(&Value::Null).is_none());
        assert_eq!(parse_latest(&json!({"close": 64000.5})).unwrap().close, 64000.5);
    }
}

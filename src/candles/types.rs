use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One OHLCV candle; `timestamp` is epoch milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Close price at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub timestamp: i64,
    pub close: f64,
}

impl Candle {
    /// Build from a JSON object, tolerating missing or non-numeric fields
    ///
    /// Missing prices read as `0`, a missing timestamp as the current time.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            timestamp: object
                .get("timestamp")
                .and_then(number_i64)
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
            open: object.get("open").and_then(number_f64).unwrap_or(0.0),
            high: object.get("high").and_then(number_f64).unwrap_or(0.0),
            low: object.get("low").and_then(number_f64).unwrap_or(0.0),
            close: object.get("close").and_then(number_f64).unwrap_or(0.0),
            volume: object.get("volume").and_then(number_f64).unwrap_or(0.0),
        })
    }

    /// Close, or high when the close is not a positive number
    pub fn reference_price(&self) -> Option<f64> {
        if self.close > 0.0 {
            Some(self.close)
        } else if self.high > 0.0 {
            Some(self.high)
        } else {
            None
        }
    }

    pub fn has_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .any(|p| *p > 0.0)
    }
}

impl ClosePoint {
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            timestamp: object.get("timestamp").and_then(number_i64).unwrap_or(0),
            close: object.get("close").and_then(number_f64).unwrap_or(0.0),
        })
    }
}

fn number_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Query-string parameters for history requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandleQuery {
    pub limit: u32,
    /// Epoch milliseconds
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

impl CandleQuery {
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            start_ts: None,
            end_ts: None,
        }
    }

    pub fn range(limit: u32, start_ts: i64, end_ts: i64) -> Self {
        Self {
            limit,
            start_ts: Some(start_ts),
            end_ts: Some(end_ts),
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string())];
        if let Some(start) = self.start_ts {
            params.push(("start_ts", start.to_string()));
        }
        if let Some(end) = self.end_ts {
            params.push(("end_ts", end.to_string()));
        }
        params
    }
}

/// Minutes (`5`, `60`, ...) or `D` for daily candles
pub fn is_valid_timeframe(timeframe: &str) -> bool {
    let tf = timeframe.trim();
    tf.eq_ignore_ascii_case("d")
        || (!tf.is_empty() && tf.len() <= 5 && tf.chars().all(|c| c.is_ascii_digit()) && tf != "0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_candle_missing_keys_default_to_zero() {
        let candle = Candle::from_json(&json!({"timestamp": 1700000000000i64, "close": 42.5})).unwrap();
        assert_eq!(candle.timestamp, 1700000000000);
        assert_eq!(candle.close, 42.5);
        assert_eq!(candle.open, 0.0);
        assert_eq!(candle.volume, 0.0);
    }

    #[test]
    fn test_candle_missing_timestamp_is_now() {
        let before = Utc::now().timestamp_millis();
        let candle = Candle::from_json(&json!({"open": "1.5"})).unwrap();
        assert!(candle.timestamp >= before);
        assert_eq!(candle.open, 1.5);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Candle::from_json(&json!([1, 2, 3])).is_none());
        assert!(Candle::from_json(&Value::Null).is_none());
    }

    #[test]
    fn test_reference_price_falls_back_to_high() {
        let mut candle = Candle::from_json(&json!({"high": 10.0})).unwrap();
        assert_eq!(candle.reference_price(), Some(10.0));
        candle.close = 9.5;
        assert_eq!(candle.reference_price(), Some(9.5));
        candle.close = 0.0;
        candle.high = 0.0;
        assert_eq!(candle.reference_price(), None);
    }

    #[test]
    fn test_query_params() {
        assert_eq!(CandleQuery::latest(100).to_params(), vec![("limit", "100".to_string())]);
        assert_eq!(CandleQuery::range(1000, 1, 2).to_params().len(), 3);
    }

    #[test]
    fn test_timeframes() {
        assert!(is_valid_timeframe("5"));
        assert!(is_valid_timeframe("240"));
        assert!(is_valid_timeframe("D"));
        assert!(!is_valid_timeframe("0"));
        assert!(!is_valid_timeframe("5m"));
        assert!(!is_valid_timeframe(""));
    }
}

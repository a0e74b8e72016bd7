//! User-typed chart queries
//!
//! ```text
//! btcusdt 5 100                                  latest 100 candles
//! btcusdt 5 20.05.2024 10:00 - 21.05.2024 12:30  date range (UTC)
//! btcusdt 5 10:00 20.05.24 12:30 21.05.24        same range, time first
//! ```
//!
//! The quick-chart wizard additionally accepts two clock times for today,
//! `10:00 16:30`.

use super::types::is_valid_timeframe;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("expected `symbol timeframe limit` or `symbol timeframe DD.MM.YYYY HH:MM - DD.MM.YYYY HH:MM`")]
    UnknownFormat,
    #[error("unrecognized timeframe '{0}'")]
    BadTimeframe(String),
    #[error("unrecognized date or time '{0}'")]
    BadDate(String),
    #[error("the start must be earlier than the end")]
    EmptyRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindow {
    Latest(u32),
    /// Epoch milliseconds, UTC
    Range { start_ms: i64, end_ms: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuery {
    pub symbol: String,
    pub timeframe: String,
    pub window: QueryWindow,
    /// The requested limit was out of bounds and replaced by the maximum
    pub limit_clamped: bool,
}

impl QueryWindow {
    pub fn from_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, QueryError> {
        if start >= end {
            return Err(QueryError::EmptyRange);
        }
        Ok(QueryWindow::Range {
            start_ms: start.timestamp_millis(),
            end_ms: end.timestamp_millis(),
        })
    }

    /// Chart title suffix
    pub fn describe(&self) -> String {
        match self {
            QueryWindow::Latest(limit) => format!("last {} candles", limit),
            QueryWindow::Range { start_ms, end_ms } => {
                let fmt = |ms: i64| {
                    Utc.timestamp_millis_opt(ms)
                        .single()
                        .map(|t| t.format("%d.%m.%y %H:%M").to_string())
                        .unwrap_or_else(|| ms.to_string())
                };
                format!("{} - {} UTC", fmt(*start_ms), fmt(*end_ms))
            }
        }
    }
}

/// Parse a free-form query
///
/// `max_limit` caps the candle count; a zero or larger limit is clamped.
pub fn parse_query(text: &str, max_limit: u32) -> Result<ChartQuery, QueryError> {
    let lowered = text.trim().to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(QueryError::UnknownFormat);
    }

    let symbol = tokens[0];
    if !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(QueryError::UnknownFormat);
    }
    let timeframe = tokens[1];
    if !is_valid_timeframe(timeframe) {
        return Err(QueryError::BadTimeframe(timeframe.to_string()));
    }
    let timeframe = if timeframe == "d" { "D" } else { timeframe };

    let rest = &tokens[2..];
    let (window, limit_clamped) = match rest {
        [limit] => {
            let requested: i64 = limit.parse().map_err(|_| QueryError::UnknownFormat)?;
            if requested <= 0 || requested > i64::from(max_limit) {
                (QueryWindow::Latest(max_limit), true)
            } else {
                (QueryWindow::Latest(requested as u32), false)
            }
        }
        _ => (parse_range(&rest.join(" "))?, false),
    };

    Ok(ChartQuery {
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        window,
        limit_clamped,
    })
}

/// Parse `DD.MM.YYYY HH:MM - DD.MM.YYYY HH:MM` (or the time-first form)
pub fn parse_range(text: &str) -> Result<QueryWindow, QueryError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (start, end) = match tokens.as_slice() {
        [start_date, start_time, "-", end_date, end_time] => (
            parse_datetime(start_date, start_time)?,
            parse_datetime(end_date, end_time)?,
        ),
        [start_time, start_date, end_time, end_date] => (
            parse_datetime(start_date, start_time)?,
            parse_datetime(end_date, end_time)?,
        ),
        _ => return Err(QueryError::UnknownFormat),
    };
    QueryWindow::from_range(Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
}

/// Parse two clock times (`10:00 16:30`, `10 16`, `9_30 11-00`) on `day`
pub fn parse_day_range(text: &str, day: NaiveDate) -> Result<QueryWindow, QueryError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [start, end] = tokens.as_slice() else {
        return Err(QueryError::UnknownFormat);
    };
    let start = parse_clock(start).ok_or_else(|| QueryError::BadDate(start.to_string()))?;
    let end = parse_clock(end).ok_or_else(|| QueryError::BadDate(end.to_string()))?;
    QueryWindow::from_range(
        Utc.from_utc_datetime(&day.and_time(start)),
        Utc.from_utc_datetime(&day.and_time(end)),
    )
}

fn parse_datetime(date: &str, time: &str) -> Result<NaiveDateTime, QueryError> {
    let bad = || QueryError::BadDate(format!("{} {}", date, time));

    let date = date.replace(['/', '-'], ".");
    let year_len = date.rsplit('.').next().map(str::len).unwrap_or(0);
    let format = match year_len {
        2 => "%d.%m.%y",
        4 => "%d.%m.%Y",
        _ => return Err(bad()),
    };
    let day = NaiveDate::parse_from_str(&date, format).map_err(|_| bad())?;
    let clock = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| bad())?;
    Ok(day.and_time(clock))
}

fn parse_clock(text: &str) -> Option<NaiveTime> {
    let mut parts = text.split([':', '_', '-']);
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = match parts.next() {
        Some(m) if m.len() == 2 => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_query() {
        let query = parse_query("BTCUSDT 5 100", 1000).unwrap();
        assert_eq!(query.symbol, "btcusdt");
        assert_eq!(query.timeframe, "5");
        assert_eq!(query.window, QueryWindow::Latest(100));
        assert!(!query.limit_clamped);
    }

    #[test]
    fn test_limit_clamped() {
        let query = parse_query("ethusdt 15 5000", 1000).unwrap();
        assert_eq!(query.window, QueryWindow::Latest(1000));
        assert!(query.limit_clamped);
        assert!(parse_query("ethusdt 15 0", 1000).unwrap().limit_clamped);
    }

    #[test]
    fn test_range_query_both_layouts() {
        let dashed = parse_query("ethusdt 15 20.05.2024 10:00 - 21.05.2024 12:30", 1000).unwrap();
        let time_first = parse_query("ethusdt 15 10:00 20.05.24 12:30 21.05.24", 1000).unwrap();
        assert_eq!(dashed.window, time_first.window);

        let expected_start = Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap();
        match dashed.window {
            QueryWindow::Range { start_ms, .. } => {
                assert_eq!(start_ms, expected_start.timestamp_millis())
            }
            other => panic!("unexpected window {:?}", other),
        }
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert_eq!(
            parse_range("21.05.2024 10:00 - 20.05.2024 10:00"),
            Err(QueryError::EmptyRange)
        );
    }

    #[test]
    fn test_bad_inputs() {
        assert_eq!(parse_query("btcusdt 5", 1000), Err(QueryError::UnknownFormat));
        assert_eq!(
            parse_query("btcusdt 5m 100", 1000),
            Err(QueryError::BadTimeframe("5m".to_string()))
        );
        assert!(matches!(
            parse_query("btcusdt 5 32.13.2024 10:00 - 01.01.2025 10:00", 1000),
            Err(QueryError::BadDate(_))
        ));
        assert_eq!(parse_query("btcusdt 5 many", 1000), Err(QueryError::UnknownFormat));
    }

    #[test]
    fn test_day_range() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let window = parse_day_range("10 16:30", day).unwrap();
        assert_eq!(
            window,
            QueryWindow::Range {
                start_ms: Utc.with_ymd_and_hms(2024, 5, 20, 10, 0, 0).unwrap().timestamp_millis(),
                end_ms: Utc.with_ymd_and_hms(2024, 5, 20, 16, 30, 0).unwrap().timestamp_millis(),
            }
        );
        assert_eq!(parse_day_range("16:00 10:00", day), Err(QueryError::EmptyRange));
        assert!(parse_day_range("25:00 26:00", day).is_err());
        assert!(parse_day_range("10:00", day).is_err());
    }
}

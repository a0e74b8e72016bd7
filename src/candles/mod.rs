//! Upstream candle API
//!
//! - `types`: candle records and request parameters
//! - `client`: HTTP client; every failure is logged and reported as `None`
//! - `query`: parsing of user-typed chart queries

pub mod client;
pub mod query;
pub mod types;

pub use client::{ApiAuthStatus, CandleApiClient};
pub use query::{parse_day_range, parse_query, parse_range, ChartQuery, QueryError, QueryWindow};
pub use types::{is_valid_timeframe, Candle, CandleQuery, ClosePoint};

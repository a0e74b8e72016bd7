//! Special logging functions for specific use cases

use super::tags::LogTag;
use crate::logger;

/// Log a cached price change with a direction indicator
///
/// `old_price` is `None` on the first observed value.
pub fn log_price_change(symbol: &str, old_price: Option<&str>, new_price: &str) {
    let old_value = old_price.and_then(|p| p.parse::<f64>().ok());
    let new_value = new_price.parse::<f64>().ok();

    let message = match (old_value, new_value) {
        (Some(old), Some(new)) if old != 0.0 => {
            let change_percent = (new - old) / old * 100.0;
            let arrow = if change_percent > 0.0 {
                "▲"
            } else if change_percent < 0.0 {
                "▼"
            } else {
                "="
            };
            format!(
                "{} {} -> {} ({} {:+.2}%)",
                symbol,
                old_price.unwrap_or("N/A"),
                new_price,
                arrow,
                change_percent
            )
        }
        _ => format!("{} first value: {}", symbol, new_price),
    };

    logger::info(LogTag::Description, &message);
}

//! Lifetime strings for new codes
//!
//! `0` (or nothing) means unbounded; otherwise a positive count followed by
//! `m`, `h` or `d`, in any case: `30m`, `12H`, `7d`.

use crate::errors::{BotError, BotResult};
use crate::logger::{self, LogTag};
use chrono::{Duration, Utc};

/// Strict parse: `Ok(None)` for unbounded, an error for anything malformed
pub fn parse_ttl(text: &str) -> BotResult<Option<Duration>> {
    let text = text.trim().to_lowercase();
    if text.is_empty() || text == "0" {
        return Ok(None);
    }

    let malformed = || BotError::Validation(format!("malformed lifetime '{}'", text));

    let unit = text.chars().last().ok_or_else(malformed)?;
    let digits = &text[..text.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(malformed());
    }
    let value: u32 = digits.parse().map_err(|_| malformed())?;
    if value == 0 {
        return Err(malformed());
    }

    let value = i64::from(value);
    let ttl = match unit {
        'm' => Duration::seconds(value * 60),
        'h' => Duration::seconds(value * 3_600),
        'd' => Duration::seconds(value * 86_400),
        _ => return Err(malformed()),
    };

    // The expiry must stay representable as a timestamp
    if Utc::now().checked_add_signed(ttl).is_none() {
        return Err(BotError::Validation(format!("lifetime '{}' is too long", text)));
    }
    Ok(Some(ttl))
}

/// Lenient parse used when issuing codes: malformed input becomes unbounded
pub fn ttl_or_unbounded(text: &str) -> Option<Duration> {
    match parse_ttl(text) {
        Ok(ttl) => ttl,
        Err(e) => {
            logger::warning(
                LogTag::Referral,
                &format!("{}; the code will not expire", e),
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_ttl("30m").unwrap(), Some(Duration::minutes(30)));
        assert_eq!(parse_ttl("12H").unwrap(), Some(Duration::hours(12)));
        assert_eq!(parse_ttl(" 7d ").unwrap(), Some(Duration::days(7)));
    }

    #[test]
    fn test_unbounded_forms() {
        assert_eq!(parse_ttl("0").unwrap(), None);
        assert_eq!(parse_ttl("").unwrap(), None);
    }

    #[test]
    fn test_malformed_inputs() {
        for text in ["1x", "m", "-5m", "0m", "1.5h", "abc", "10 m", "99999999999d"] {
            assert!(parse_ttl(text).is_err(), "{} should be rejected", text);
            assert_eq!(ttl_or_unbounded(text), None);
        }
    }

    #[test]
    fn test_lifetime_past_calendar_range_rejected() {
        let err = parse_ttl("100000000d").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("too long"));
        assert_eq!(ttl_or_unbounded("100000000d"), None);
        assert!(parse_ttl("36500d").unwrap().is_some());
    }
}

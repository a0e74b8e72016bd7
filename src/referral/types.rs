use crate::storage::Keyed;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Stored referral code
///
/// `expiration` is epoch seconds; `None` never expires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralCode {
    pub code: String,
    pub activations_left: u32,
    #[serde(default)]
    pub expiration: Option<i64>,
}

impl ReferralCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, Some(expiration) if expiration < now.timestamp())
    }

    pub fn is_exhausted(&self) -> bool {
        self.activations_left == 0
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiration
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

impl Keyed for ReferralCode {
    type Key = String;

    fn key(&self) -> &String {
        &self.code
    }
}

/// Result of issuing a code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralLink {
    pub code: String,
    pub link: String,
    pub activations: u32,
    pub expiration: Option<i64>,
}

impl ReferralLink {
    pub fn for_bot(bot_username: &str, code: &str) -> String {
        format!(
            "https://t.me/{}?start={}",
            bot_username.trim_start_matches('@'),
            code
        )
    }
}

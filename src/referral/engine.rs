//! Issuing, redeeming and listing referral codes
//!
//! A redemption is persisted before the user is whitelisted, and the
//! referral collection lock is released first, so the two locks never nest.

use super::sweep::{sweep, RemovalReason};
use super::ttl::ttl_or_unbounded;
use super::types::{ReferralCode, ReferralLink};
use crate::access::AccessRegistry;
use crate::clock::{Clock, SystemClock};
use crate::errors::{BotError, BotResult};
use crate::logger::{self, LogTag};
use crate::storage::{contains_key, remove_by_key, JsonFileStore, KeyedRecordStore, MemoryStore, SharedStore};
use chrono::{Local, TimeZone};
use std::path::Path;
use std::sync::Arc;

const MAX_CODE_ATTEMPTS: usize = 32;

pub struct ReferralEngine {
    store: SharedStore<ReferralCode>,
    registry: Arc<AccessRegistry>,
    clock: Arc<dyn Clock>,
}

impl ReferralEngine {
    pub fn new(
        backing: Arc<dyn KeyedRecordStore<ReferralCode>>,
        registry: Arc<AccessRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: SharedStore::new(backing),
            registry,
            clock,
        }
    }

    pub fn open(path: &Path, registry: Arc<AccessRegistry>) -> Self {
        Self::new(
            Arc::new(JsonFileStore::new("referrals", path)),
            registry,
            Arc::new(SystemClock),
        )
    }

    pub fn in_memory(registry: Arc<AccessRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryStore::new("referrals")), registry, clock)
    }

    /// Issue a new code
    ///
    /// `ttl_spec` follows the lifetime grammar; malformed lifetimes are
    /// logged and the code is issued without expiry.
    pub async fn generate(
        &self,
        activations: i64,
        ttl_spec: &str,
        bot_username: &str,
    ) -> BotResult<ReferralLink> {
        if activations <= 0 {
            return Err(BotError::Validation(format!(
                "activation count must be positive, got {}",
                activations
            )));
        }
        let activations = u32::try_from(activations).map_err(|_| {
            BotError::Validation(format!("activation count {} is too large", activations))
        })?;

        let expiration = match ttl_or_unbounded(ttl_spec) {
            Some(ttl) => {
                let at = self.clock.now().checked_add_signed(ttl).ok_or_else(|| {
                    BotError::Validation(format!("lifetime '{}' is too long", ttl_spec.trim()))
                })?;
                Some(at.timestamp())
            }
            None => None,
        };

        let mut guard = self.store.begin().await;
        let code = unique_code(guard.records())?;
        guard.records_mut().push(ReferralCode {
            code: code.clone(),
            activations_left: activations,
            expiration,
        });
        if !guard.commit().await {
            return Err(BotError::Storage(format!(
                "referral code {} could not be saved",
                code
            )));
        }

        let link = ReferralLink::for_bot(bot_username, &code);
        logger::info(
            LogTag::Referral,
            &format!(
                "Issued referral code {} ({} activations, {})",
                code,
                activations,
                describe_expiry(expiration)
            ),
        );

        Ok(ReferralLink {
            code,
            link,
            activations,
            expiration,
        })
    }

    /// Redeem `code` for a user
    ///
    /// Returns true iff one activation was consumed and the user whitelisted.
    pub async fn redeem(&self, code: &str, user_id: i64, username: &str) -> bool {
        let code = code.trim();
        let now = self.clock.now();

        let mut guard = self.store.begin().await;
        let (mut live, removed) = sweep(guard.records().to_vec(), now);

        for dropped in &removed {
            let reason = match dropped.reason {
                RemovalReason::Expired => "expired",
                RemovalReason::Exhausted => "exhausted",
            };
            logger::info(
                LogTag::Referral,
                &format!("Dropping {} referral code {}", reason, dropped.record.code),
            );
        }
        if removed.iter().any(|r| r.record.code == code) {
            logger::warning(
                LogTag::Referral,
                &format!("Referral code {} is no longer valid", code),
            );
        }

        let mut consumed = false;
        if let Some(position) = live.iter().position(|r| r.code == code) {
            let record = &mut live[position];
            record.activations_left -= 1;
            if record.is_exhausted() {
                logger::info(
                    LogTag::Referral,
                    &format!("Referral code {} used up, removing", code),
                );
                live.remove(position);
            }
            consumed = true;
        }

        let left = live
            .iter()
            .find(|r| r.code == code)
            .map_or(0, |r| r.activations_left);
        if consumed || !removed.is_empty() {
            *guard.records_mut() = live;
        }
        if !guard.commit().await {
            if consumed {
                logger::error(
                    LogTag::Referral,
                    &format!(
                        "Referral code {} not redeemed for {} ({}): activation could not be saved",
                        code, username, user_id
                    ),
                );
            }
            return false;
        }

        if !consumed {
            logger::warning(
                LogTag::Referral,
                &format!(
                    "Referral code {} not redeemed for {} ({})",
                    code, username, user_id
                ),
            );
            return false;
        }

        self.registry.add_to_whitelist(user_id, username).await;
        logger::info(
            LogTag::Referral,
            &format!(
                "Referral code {} redeemed by {} ({}), {} activation(s) left",
                code, username, user_id, left
            ),
        );
        true
    }

    /// Live codes, after dropping expired and exhausted ones
    pub async fn active_codes(&self) -> Vec<ReferralCode> {
        let now = self.clock.now();
        let mut guard = self.store.begin().await;
        let (live, removed) = sweep(guard.records().to_vec(), now);
        if !removed.is_empty() {
            logger::info(
                LogTag::Referral,
                &format!("Dropped {} stale referral code(s)", removed.len()),
            );
            *guard.records_mut() = live.clone();
        }
        guard.commit().await;
        live
    }

    /// One display line per live code
    pub async fn list_active(&self) -> Vec<String> {
        self.active_codes()
            .await
            .iter()
            .map(|r| {
                format!(
                    "Code: {}, activations left: {}, {}",
                    r.code,
                    r.activations_left,
                    describe_expiry(r.expiration)
                )
            })
            .collect()
    }

    /// Remove every record with `code`
    pub async fn deactivate(&self, code: &str) -> bool {
        let code = code.trim().to_string();
        let removed = self
            .store
            .mutate(|records| {
                let removed = remove_by_key(records, &code);
                (removed, removed > 0)
            })
            .await;

        if removed > 0 {
            logger::info(LogTag::Referral, &format!("Deactivated referral code {}", code));
            true
        } else {
            logger::warning(LogTag::Referral, &format!("Referral code {} not found", code));
            false
        }
    }
}

fn unique_code(existing: &[ReferralCode]) -> BotResult<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let candidate = format!("{:08x}", rand::random::<u32>());
        if !contains_key(existing, &candidate) {
            return Ok(candidate);
        }
        logger::debug(
            LogTag::Referral,
            &format!("Generated code {} already exists, retrying", candidate),
        );
    }
    Err(BotError::Storage(
        "could not generate an unused referral code".to_string(),
    ))
}

/// "unbounded" or the local expiry time
pub fn describe_expiry(expiration: Option<i64>) -> String {
    match expiration {
        None => "unbounded".to_string(),
        Some(secs) => match Local.timestamp_opt(secs, 0).single() {
            Some(at) => format!("until {}", at.format("%d.%m.%Y %H:%M")),
            None => format!("until timestamp {}", secs),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AdminIdentity;
    use crate::clock::ManualClock;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::tempdir;

    fn setup() -> (Arc<AccessRegistry>, Arc<ManualClock>, ReferralEngine) {
        let registry = Arc::new(AccessRegistry::in_memory(AdminIdentity::new(
            1,
            "@admin_username",
        )));
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = ReferralEngine::in_memory(registry.clone(), clock.clone());
        (registry, clock, engine)
    }

    #[tokio::test]
    async fn test_code_admits_exactly_n_users() {
        let (registry, _clock, engine) = setup();
        let issued = engine.generate(3, "0", "mk_bot").await.unwrap();
        assert_eq!(issued.code.len(), 8);
        assert!(issued.code.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(issued.link, format!("https://t.me/mk_bot?start={}", issued.code));

        for user in 10..13 {
            assert!(engine.redeem(&issued.code, user, "user").await);
            assert!(registry.is_whitelisted(user).await);
        }
        assert!(!engine.redeem(&issued.code, 13, "late").await);
        assert!(!registry.is_whitelisted(13).await);
        assert!(engine.active_codes().await.is_empty());
    }

    #[tokio::test]
    async fn test_code_expires() {
        let (registry, clock, engine) = setup();
        let issued = engine.generate(5, "1m", "mk_bot").await.unwrap();
        assert!(issued.expiration.is_some());

        clock.advance(Duration::seconds(61));
        assert!(!engine.redeem(&issued.code, 20, "user").await);
        assert!(!registry.is_whitelisted(20).await);
        assert!(engine.list_active().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_ttl_is_unbounded() {
        let (_registry, clock, engine) = setup();
        let issued = engine.generate(1, "1x", "mk_bot").await.unwrap();
        assert_eq!(issued.expiration, None);

        clock.advance(Duration::days(3650));
        let listed = engine.list_active().await;
        assert_eq!(listed.len(), 1);
        assert!(listed[0].contains("unbounded"));
    }

    #[tokio::test]
    async fn test_non_positive_activations_rejected() {
        let (_registry, _clock, engine) = setup();
        assert!(engine.generate(0, "0", "mk_bot").await.unwrap_err().is_validation());
        assert!(engine.generate(-3, "1d", "mk_bot").await.is_err());
        assert!(engine.active_codes().await.is_empty());
    }

    #[tokio::test]
    async fn test_deactivate() {
        let (_registry, _clock, engine) = setup();
        let issued = engine.generate(2, "2h", "mk_bot").await.unwrap();
        assert!(engine.deactivate(&issued.code).await);
        assert!(!engine.deactivate(&issued.code).await);
        assert!(!engine.redeem(&issued.code, 5, "user").await);
    }

    #[tokio::test]
    async fn test_unknown_code_not_redeemed() {
        let (registry, _clock, engine) = setup();
        assert!(!engine.redeem("ffffffff", 5, "user").await);
        assert!(!registry.is_whitelisted(5).await);
    }

    #[tokio::test]
    async fn test_concurrent_redemptions_never_exceed_activations() {
        let (registry, _clock, engine) = setup();
        let engine = Arc::new(engine);
        let issued = engine.generate(5, "0", "mk_bot").await.unwrap();

        let mut handles = Vec::new();
        for user in 100..140 {
            let engine = engine.clone();
            let code = issued.code.clone();
            handles.push(tokio::spawn(async move {
                engine.redeem(&code, user, "racer").await
            }));
        }

        let mut redeemed = 0;
        for handle in handles {
            if handle.await.unwrap() {
                redeemed += 1;
            }
        }
        assert_eq!(redeemed, 5);
        // Admin plus the five winners
        assert_eq!(registry.whitelist().await.len(), 6);
    }

    #[tokio::test]
    async fn test_lifetime_beyond_calendar() {
        let (_registry, _clock, engine) = setup();
        let issued = engine.generate(1, "100000000d", "mk_bot").await.unwrap();
        assert_eq!(issued.expiration, None);

        let registry = Arc::new(AccessRegistry::in_memory(AdminIdentity::new(1, "@admin_username")));
        let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::days(1)));
        let engine = ReferralEngine::in_memory(registry, clock);
        let err = engine.generate(1, "2d", "mk_bot").await.unwrap_err();
        assert!(err.is_validation());
        assert!(engine.active_codes().await.is_empty());
    }

    struct ReadOnlyStore {
        records: Vec<ReferralCode>,
    }

    #[async_trait::async_trait]
    impl KeyedRecordStore<ReferralCode> for ReadOnlyStore {
        fn name(&self) -> &str {
            "referrals"
        }

        async fn load(&self) -> Vec<ReferralCode> {
            self.records.clone()
        }

        async fn save(&self, _records: &[ReferralCode]) -> BotResult<()> {
            Err(BotError::Storage("disk full".to_string()))
        }
    }

    #[tokio::test]
    async fn test_unsaved_activation_admits_nobody() {
        let registry = Arc::new(AccessRegistry::in_memory(AdminIdentity::new(1, "@admin_username")));
        let store = ReadOnlyStore {
            records: vec![ReferralCode {
                code: "deadbeef".to_string(),
                activations_left: 1,
                expiration: None,
            }],
        };
        let engine = ReferralEngine::new(
            Arc::new(store),
            registry.clone(),
            Arc::new(ManualClock::new(Utc::now())),
        );

        for user in 50..55 {
            assert!(!engine.redeem("deadbeef", user, "user").await);
            assert!(!registry.is_whitelisted(user).await);
        }
        assert_eq!(registry.whitelist().await.len(), 1);
    }

    #[tokio::test]
    async fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("referrals.json");
        let registry = Arc::new(AccessRegistry::in_memory(AdminIdentity::new(
            1,
            "@admin_username",
        )));
        let engine = ReferralEngine::open(&path, registry);

        let issued = engine.generate(2, "0", "mk_bot").await.unwrap();
        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            serde_json::json!([{"code": issued.code, "activations_left": 2, "expiration": null}])
        );
    }
}

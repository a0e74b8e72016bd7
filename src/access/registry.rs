//! Whitelist and banlist semantics
//!
//! The administrator is always whitelisted and can never be banned, whatever
//! the files say. The whitelist file is also kept containing the administrator
//! record: any load that finds it missing appends it and saves.

use super::types::{normalize_username, UserIdentifier, UserRecord};
use crate::config::with_config;
use crate::logger::{self, LogTag};
use crate::storage::{find_by_key, remove_by_key, JsonFileStore, KeyedRecordStore, MemoryStore, SharedStore};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The configured administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub id: i64,
    pub username: String,
}

impl AdminIdentity {
    pub fn new(id: i64, username: &str) -> Self {
        Self {
            id,
            username: normalize_username(username),
        }
    }

    pub fn from_config() -> Self {
        with_config(|cfg| Self::new(cfg.telegram.admin_id, &cfg.telegram.admin_username))
    }

    pub fn record(&self) -> UserRecord {
        UserRecord {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Process-wide "whitelist enforcement" switch
///
/// Not persisted: every process starts with enforcement on.
#[derive(Debug)]
pub struct EnforcementToggle {
    enabled: AtomicBool,
}

impl EnforcementToggle {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip the switch and return the new state
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }
}

impl Default for EnforcementToggle {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of inserting or refreshing a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    UsernameUpdated,
    Unchanged,
}

/// Result of a ban request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanOutcome {
    Banned,
    /// Already banned; the stored username was refreshed
    UsernameUpdated,
    AlreadyBanned,
    AdministratorImmune,
}

fn upsert(records: &mut Vec<UserRecord>, id: i64, username: &str) -> UpsertOutcome {
    if let Some(existing) = records.iter_mut().find(|r| r.id == id) {
        if existing.username == username {
            UpsertOutcome::Unchanged
        } else {
            existing.username = username.to_string();
            UpsertOutcome::UsernameUpdated
        }
    } else {
        records.push(UserRecord {
            id,
            username: username.to_string(),
        });
        UpsertOutcome::Inserted
    }
}

pub struct AccessRegistry {
    admin: AdminIdentity,
    whitelist: SharedStore<UserRecord>,
    banlist: SharedStore<UserRecord>,
    enforcement: EnforcementToggle,
}

impl AccessRegistry {
    pub fn new(
        admin: AdminIdentity,
        whitelist: Arc<dyn KeyedRecordStore<UserRecord>>,
        banlist: Arc<dyn KeyedRecordStore<UserRecord>>,
    ) -> Self {
        Self {
            admin,
            whitelist: SharedStore::new(whitelist),
            banlist: SharedStore::new(banlist),
            enforcement: EnforcementToggle::new(),
        }
    }

    /// Registry backed by JSON files
    ///
    /// A missing whitelist is created holding only the administrator; a
    /// missing banlist is created empty.
    pub fn open(admin: AdminIdentity, whitelist_path: &Path, banlist_path: &Path) -> Self {
        let whitelist =
            JsonFileStore::new("whitelist", whitelist_path).with_fallback(vec![admin.record()]);
        let banlist = JsonFileStore::new("banlist", banlist_path);
        Self::new(admin, Arc::new(whitelist), Arc::new(banlist))
    }

    /// Registry that keeps everything in memory
    pub fn in_memory(admin: AdminIdentity) -> Self {
        let whitelist = MemoryStore::with_records("whitelist", vec![admin.record()]);
        let banlist = MemoryStore::new("banlist");
        Self::new(admin, Arc::new(whitelist), Arc::new(banlist))
    }

    pub fn admin(&self) -> &AdminIdentity {
        &self.admin
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        user_id == self.admin.id
    }

    /// Load-modify-save on the whitelist with the administrator record guaranteed present
    async fn with_whitelist<T>(&self, f: impl FnOnce(&mut Vec<UserRecord>) -> (T, bool)) -> T {
        let admin = self.admin.record();
        self.whitelist
            .mutate(|records| {
                let mut repaired = false;
                if find_by_key(records, &admin.id).is_none() {
                    logger::warning(
                        LogTag::Access,
                        &format!("Administrator {} missing from whitelist, adding", admin.id),
                    );
                    records.push(admin);
                    repaired = true;
                }
                let (result, changed) = f(records);
                (result, changed || repaired)
            })
            .await
    }

    pub async fn is_whitelisted(&self, user_id: i64) -> bool {
        if self.is_admin(user_id) || !self.enforcement.is_enabled() {
            return true;
        }
        let found = self
            .with_whitelist(|records| (find_by_key(records, &user_id).is_some(), false))
            .await;
        logger::debug(
            LogTag::Access,
            &format!("Whitelist check for {}: {}", user_id, found),
        );
        found
    }

    pub async fn is_banned(&self, user_id: i64) -> bool {
        if self.is_admin(user_id) {
            return false;
        }
        let banned = self
            .banlist
            .read(|records| find_by_key(records, &user_id).is_some())
            .await;
        logger::debug(LogTag::Access, &format!("Banlist check for {}: {}", user_id, banned));
        banned
    }

    /// Insert the user, or refresh the stored username if it changed
    pub async fn add_to_whitelist(&self, user_id: i64, username: &str) -> UpsertOutcome {
        let username = normalize_username(username);
        let outcome = self
            .with_whitelist(|records| {
                let outcome = upsert(records, user_id, &username);
                (outcome, outcome != UpsertOutcome::Unchanged)
            })
            .await;

        match outcome {
            UpsertOutcome::Inserted => logger::info(
                LogTag::Access,
                &format!("Added to whitelist: {} ({})", username, user_id),
            ),
            UpsertOutcome::UsernameUpdated => logger::info(
                LogTag::Access,
                &format!("Whitelist username for {} updated to {}", user_id, username),
            ),
            UpsertOutcome::Unchanged => logger::debug(
                LogTag::Access,
                &format!("{} ({}) already whitelisted", username, user_id),
            ),
        }
        outcome
    }

    /// Remove by numeric id or `@username`
    ///
    /// Returns false for identifiers that are neither.
    pub async fn remove_from_whitelist(&self, identifier: &str) -> bool {
        let Some(target) = UserIdentifier::parse(identifier) else {
            logger::warning(
                LogTag::Access,
                &format!("Malformed whitelist identifier (not an id or @username): {}", identifier),
            );
            return false;
        };

        let removed: Vec<UserRecord> = self
            .with_whitelist(|records| {
                let (removed, kept): (Vec<_>, Vec<_>) =
                    records.drain(..).partition(|r| target.matches(r));
                *records = kept;
                let changed = !removed.is_empty();
                (removed, changed)
            })
            .await;

        if removed.is_empty() {
            logger::warning(
                LogTag::Access,
                &format!("No whitelist entry matches {}", target),
            );
            return false;
        }
        for record in &removed {
            logger::info(
                LogTag::Access,
                &format!("Removed from whitelist: {} ({})", record.username, record.id),
            );
        }
        true
    }

    pub async fn ban(&self, user_id: i64, username: &str) -> BanOutcome {
        if self.is_admin(user_id) {
            logger::warning(
                LogTag::Access,
                &format!("Refused to ban the administrator ({})", user_id),
            );
            return BanOutcome::AdministratorImmune;
        }

        let username = normalize_username(username);
        let outcome = self
            .banlist
            .mutate(|records| {
                let outcome = upsert(records, user_id, &username);
                (outcome, outcome != UpsertOutcome::Unchanged)
            })
            .await;

        match outcome {
            UpsertOutcome::Inserted => {
                logger::info(LogTag::Access, &format!("Banned {} ({})", username, user_id));
                BanOutcome::Banned
            }
            UpsertOutcome::UsernameUpdated => {
                logger::info(
                    LogTag::Access,
                    &format!("Banlist username for {} updated to {}", user_id, username),
                );
                BanOutcome::UsernameUpdated
            }
            UpsertOutcome::Unchanged => {
                logger::warning(
                    LogTag::Access,
                    &format!("{} ({}) is already banned", username, user_id),
                );
                BanOutcome::AlreadyBanned
            }
        }
    }

    /// True only when the user was newly banned
    pub async fn ban_user(&self, user_id: i64, username: &str) -> bool {
        self.ban(user_id, username).await == BanOutcome::Banned
    }

    pub async fn unban_user(&self, user_id: i64) -> bool {
        let removed = self
            .banlist
            .mutate(|records| {
                let removed = remove_by_key(records, &user_id);
                (removed, removed > 0)
            })
            .await;

        if removed > 0 {
            logger::info(LogTag::Access, &format!("Unbanned {}", user_id));
            true
        } else {
            logger::warning(LogTag::Access, &format!("{} is not in the banlist", user_id));
            false
        }
    }

    pub async fn whitelist(&self) -> Vec<UserRecord> {
        self.with_whitelist(|records| (records.clone(), false)).await
    }

    pub async fn banlist(&self) -> Vec<UserRecord> {
        self.banlist.snapshot().await
    }

    pub fn enforcement_enabled(&self) -> bool {
        self.enforcement.is_enabled()
    }

    /// Flip whitelist enforcement, returning the new state
    pub fn toggle_enforcement(&self) -> bool {
        let enabled = self.enforcement.toggle();
        logger::info(
            LogTag::Access,
            &format!(
                "Whitelist enforcement {}",
                if enabled { "enabled" } else { "disabled" }
            ),
        );
        enabled
    }
}

//! Whitelist, banlist and the access gate
//!
//! `AccessRegistry` owns both collections and the enforcement toggle.
//! `AccessGate` turns a user id into the single allow/deny decision the
//! Telegram dispatcher checks before any protected handler runs.

mod gate;
mod registry;
mod types;

pub use gate::{AccessDecision, AccessGate, ADMIN_ONLY_MESSAGE};
pub use registry::{AccessRegistry, AdminIdentity, BanOutcome, EnforcementToggle, UpsertOutcome};
pub use types::{normalize_username, placeholder_username, UserIdentifier, UserRecord};

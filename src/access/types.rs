use crate::storage::Keyed;
use serde::{Deserialize, Serialize};

/// Prefix of the username recorded for users without a public @username
pub const PLACEHOLDER_PREFIX: &str = "ID_";

/// Entry of the whitelist or banlist
///
/// `id` identifies the user; `username` is informational and refreshed when
/// the user shows up under a new name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub username: String,
}

impl UserRecord {
    pub fn new(id: i64, username: &str) -> Self {
        Self {
            id,
            username: normalize_username(username),
        }
    }
}

impl Keyed for UserRecord {
    type Key = i64;

    fn key(&self) -> &i64 {
        &self.id
    }
}

/// Prefix `@` unless the name already has it or is an `ID_` placeholder
pub fn normalize_username(username: &str) -> String {
    let trimmed = username.trim();
    if trimmed.starts_with('@') || trimmed.starts_with(PLACEHOLDER_PREFIX) {
        trimmed.to_string()
    } else {
        format!("@{}", trimmed)
    }
}

/// Username stored for a user who has no public username
pub fn placeholder_username(id: i64) -> String {
    format!("{}{}", PLACEHOLDER_PREFIX, id)
}

/// Admin input naming a user: a numeric id or an `@username`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentifier {
    Id(i64),
    Username(String),
}

impl UserIdentifier {
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Some(name) = trimmed.strip_prefix('@') {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return None;
            }
            return Some(UserIdentifier::Username(trimmed.to_string()));
        }
        trimmed.parse::<i64>().ok().map(UserIdentifier::Id)
    }

    pub fn matches(&self, record: &UserRecord) -> bool {
        match self {
            UserIdentifier::Id(id) => record.id == *id,
            UserIdentifier::Username(name) => record.username == *name,
        }
    }
}

impl std::fmt::Display for UserIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserIdentifier::Id(id) => write!(f, "{}", id),
            UserIdentifier::Username(name) => write!(f, "{}", name),
        }
    }
}

//! Single allow/deny decision for user-facing actions
//!
//! Ban is checked before the whitelist, so a banned user who is also
//! whitelisted gets the ban message.

use super::registry::AccessRegistry;
use crate::logger::{self, LogTag};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    Banned,
    NotWhitelisted,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    /// Reply sent in chat when the action is refused
    pub fn denial_message(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Allowed => None,
            AccessDecision::Banned => Some("🚫 You are banned and cannot use this bot."),
            AccessDecision::NotWhitelisted => Some(
                "🔒 You do not have access to this bot. Contact the administrator or use a referral link.",
            ),
        }
    }

    /// Short text for callback-query alerts
    pub fn denial_alert(&self) -> Option<&'static str> {
        match self {
            AccessDecision::Allowed => None,
            AccessDecision::Banned => Some("🚫 You are banned."),
            AccessDecision::NotWhitelisted => Some("🔒 No access."),
        }
    }
}

pub const ADMIN_ONLY_MESSAGE: &str = "⛔ This action is available to the administrator only.";

#[derive(Clone)]
pub struct AccessGate {
    registry: Arc<AccessRegistry>,
}

impl AccessGate {
    pub fn new(registry: Arc<AccessRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<AccessRegistry> {
        &self.registry
    }

    pub async fn check(&self, user_id: i64, username: &str) -> AccessDecision {
        let decision = if self.registry.is_banned(user_id).await {
            AccessDecision::Banned
        } else if !self.registry.is_whitelisted(user_id).await {
            AccessDecision::NotWhitelisted
        } else {
            AccessDecision::Allowed
        };

        match decision {
            AccessDecision::Allowed => {}
            AccessDecision::Banned => logger::warning(
                LogTag::Access,
                &format!("Access denied (banned): {} ({})", username, user_id),
            ),
            AccessDecision::NotWhitelisted => logger::warning(
                LogTag::Access,
                &format!("Access denied (not whitelisted): {} ({})", username, user_id),
            ),
        }
        decision
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.registry.is_admin(user_id)
    }

    pub fn admin_only_message(&self) -> &'static str {
        ADMIN_ONLY_MESSAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AdminIdentity;

    fn gate() -> AccessGate {
        AccessGate::new(Arc::new(AccessRegistry::in_memory(AdminIdentity::new(
            1,
            "@admin_username",
        ))))
    }

    #[tokio::test]
    async fn test_ban_checked_before_whitelist() {
        let gate = gate();
        gate.registry().add_to_whitelist(2, "bob").await;
        gate.registry().ban_user(2, "bob").await;
        assert_eq!(gate.check(2, "@bob").await, AccessDecision::Banned);
    }

    #[tokio::test]
    async fn test_unknown_user_not_whitelisted() {
        let gate = gate();
        let decision = gate.check(3, "@stranger").await;
        assert_eq!(decision, AccessDecision::NotWhitelisted);
        assert_ne!(decision.denial_message(), AccessDecision::Banned.denial_message());
    }

    #[tokio::test]
    async fn test_admin_always_allowed() {
        let gate = gate();
        assert!(gate.check(1, "@admin_username").await.is_allowed());
        assert!(gate.is_admin(1));
        assert!(!gate.is_admin(2));
    }
}

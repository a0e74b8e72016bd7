//! Per-chat conversation state
//!
//! Multi-step inputs (chart queries, admin wizards) remember which step a
//! chat is on. State lives in memory only and is lost on restart.

use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Candles,
    Close,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Candles => "candles",
            ChartKind::Close => "close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Waiting for a free-form `symbol timeframe limit|range` query
    AwaitingQuery(ChartKind),
    /// Quick chart: waiting for two clock times for today
    AwaitingPeriod { symbol: String, timeframe: String },
    AwaitingActivations,
    AwaitingTtl { activations: i64 },
    AwaitingWhitelistRemoval,
    AwaitingBan,
    AwaitingUnban,
    AwaitingDeactivation,
}

impl ConversationState {
    /// Steps only the administrator can be on
    pub fn is_admin_step(&self) -> bool {
        !matches!(
            self,
            ConversationState::AwaitingQuery(_) | ConversationState::AwaitingPeriod { .. }
        )
    }
}

#[derive(Default)]
pub struct ConversationStore {
    states: RwLock<HashMap<i64, ConversationState>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, chat_id: i64) -> Option<ConversationState> {
        self.states.read().await.get(&chat_id).cloned()
    }

    pub async fn set(&self, chat_id: i64, state: ConversationState) {
        self.states.write().await.insert(chat_id, state);
    }

    pub async fn clear(&self, chat_id: i64) -> Option<ConversationState> {
        self.states.write().await.remove(&chat_id)
    }
}

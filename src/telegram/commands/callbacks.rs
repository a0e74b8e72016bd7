//! Callback query handlers for inline keyboard buttons

use super::{admin, charts, menu, Actor};
use crate::logger::{self, LogTag};
use crate::telegram::context::BotContext;
use crate::telegram::state::{ChartKind, ConversationState};
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Panel,
    CreateReferral,
    ListReferrals,
    DeactivateReferral,
    ViewWhitelist,
    ViewBanlist,
    DownloadLog,
    RemoveFromWhitelist,
    Ban,
    Unban,
    ToggleEnforcement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    MainMenu,
    Faq,
    QuickCharts,
    QuickSymbol(String),
    QuickTimeframe { symbol: String, timeframe: String },
    QuickLatest { symbol: String, timeframe: String },
    QuickPeriod { symbol: String, timeframe: String },
    Query(ChartKind),
    Pairs(usize),
    Noop,
    Admin(AdminAction),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        let action = match parts.as_slice() {
            ["menu", "main"] => CallbackAction::MainMenu,
            ["menu", "faq"] => CallbackAction::Faq,
            ["menu", "quick"] => CallbackAction::QuickCharts,
            ["qc", "sym", symbol] => CallbackAction::QuickSymbol(symbol.to_string()),
            ["qc", "tf", symbol, tf] => CallbackAction::QuickTimeframe {
                symbol: symbol.to_string(),
                timeframe: tf.to_string(),
            },
            ["qc", "latest", symbol, tf] => CallbackAction::QuickLatest {
                symbol: symbol.to_string(),
                timeframe: tf.to_string(),
            },
            ["qc", "period", symbol, tf] => CallbackAction::QuickPeriod {
                symbol: symbol.to_string(),
                timeframe: tf.to_string(),
            },
            ["query", "candles"] => CallbackAction::Query(ChartKind::Candles),
            ["query", "close"] => CallbackAction::Query(ChartKind::Close),
            ["pairs", page] => CallbackAction::Pairs(page.parse().ok()?),
            ["noop"] => CallbackAction::Noop,
            ["admin", action] => CallbackAction::Admin(match *action {
                "panel" => AdminAction::Panel,
                "create_ref" => AdminAction::CreateReferral,
                "refs" => AdminAction::ListReferrals,
                "remove_ref" => AdminAction::DeactivateReferral,
                "whitelist" => AdminAction::ViewWhitelist,
                "banlist" => AdminAction::ViewBanlist,
                "log" => AdminAction::DownloadLog,
                "remove_wl" => AdminAction::RemoveFromWhitelist,
                "ban" => AdminAction::Ban,
                "unban" => AdminAction::Unban,
                "toggle_wl" => AdminAction::ToggleEnforcement,
                _ => return None,
            }),
            _ => return None,
        };
        Some(action)
    }

    pub fn is_admin_action(&self) -> bool {
        matches!(self, CallbackAction::Admin(_))
    }
}

/// Handle a parsed button press from a user who passed the guards
pub async fn handle_callback_query(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    actor: &Actor,
    query_id: &str,
    action: CallbackAction,
) -> Result<(), String> {
    logger::debug(
        LogTag::Telegram,
        &format!("Callback {:?} from {}", action, actor.label()),
    );

    // Toggle and log download answer with their own text
    match &action {
        CallbackAction::Admin(AdminAction::ToggleEnforcement) => {
            let alert = admin::toggle_enforcement(ctx);
            ctx.bot
                .answer_callback_query(query_id)
                .text(alert)
                .show_alert(true)
                .await
                .map_err(|e| format!("Failed to answer callback: {}", e))?;
            return admin::show_panel(ctx, chat_id, message_id).await;
        }
        CallbackAction::Admin(AdminAction::DownloadLog) => {
            ctx.bot
                .answer_callback_query(query_id)
                .text("📤 Sending the log file...")
                .await
                .map_err(|e| format!("Failed to answer callback: {}", e))?;
            return admin::send_log_file(ctx, chat_id).await;
        }
        _ => {
            ctx.bot
                .answer_callback_query(query_id)
                .await
                .map_err(|e| format!("Failed to answer callback: {}", e))?;
        }
    }

    match action {
        CallbackAction::MainMenu => {
            ctx.conversations.clear(chat_id.0).await;
            menu::send_main_menu(ctx, chat_id, actor.id, message_id).await
        }
        CallbackAction::Faq => menu::send_faq(ctx, chat_id, message_id).await,
        CallbackAction::Pairs(page) => menu::send_pair_page(ctx, chat_id, message_id, page).await,
        CallbackAction::Noop => Ok(()),

        CallbackAction::QuickCharts => charts::show_quick_symbols(ctx, chat_id, message_id).await,
        CallbackAction::QuickSymbol(symbol) => {
            charts::show_quick_timeframes(ctx, chat_id, message_id, &symbol).await
        }
        CallbackAction::QuickTimeframe { symbol, timeframe } => {
            charts::show_quick_period(ctx, chat_id, message_id, &symbol, &timeframe).await
        }
        CallbackAction::QuickLatest { symbol, timeframe } => {
            charts::quick_latest(ctx, chat_id, &symbol, &timeframe).await
        }
        CallbackAction::QuickPeriod { symbol, timeframe } => {
            charts::request_quick_period(ctx, chat_id, message_id, &symbol, &timeframe).await
        }
        CallbackAction::Query(kind) => charts::start_query(ctx, chat_id, kind).await,

        CallbackAction::Admin(action) => handle_admin_action(ctx, chat_id, message_id, action).await,
    }
}

async fn handle_admin_action(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    action: AdminAction,
) -> Result<(), String> {
    match action {
        AdminAction::Panel => admin::show_panel(ctx, chat_id, message_id).await,
        AdminAction::CreateReferral => {
            admin::begin_step(ctx, chat_id, message_id, ConversationState::AwaitingActivations).await
        }
        AdminAction::ListReferrals => admin::show_referrals(ctx, chat_id, message_id).await,
        AdminAction::DeactivateReferral => {
            admin::begin_step(ctx, chat_id, message_id, ConversationState::AwaitingDeactivation).await
        }
        AdminAction::ViewWhitelist => admin::show_whitelist(ctx, chat_id, message_id).await,
        AdminAction::ViewBanlist => admin::show_banlist(ctx, chat_id, message_id).await,
        AdminAction::RemoveFromWhitelist => {
            admin::begin_step(ctx, chat_id, message_id, ConversationState::AwaitingWhitelistRemoval).await
        }
        AdminAction::Ban => admin::begin_step(ctx, chat_id, message_id, ConversationState::AwaitingBan).await,
        AdminAction::Unban => admin::begin_step(ctx, chat_id, message_id, ConversationState::AwaitingUnban).await,
        AdminAction::ToggleEnforcement | AdminAction::DownloadLog => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_and_quick_actions() {
        assert_eq!(CallbackAction::parse("menu:main"), Some(CallbackAction::MainMenu));
        assert_eq!(
            CallbackAction::parse("qc:tf:btcusdt:15"),
            Some(CallbackAction::QuickTimeframe {
                symbol: "btcusdt".to_string(),
                timeframe: "15".to_string()
            })
        );
        assert_eq!(
            CallbackAction::parse("query:close"),
            Some(CallbackAction::Query(ChartKind::Close))
        );
        assert_eq!(CallbackAction::parse("pairs:3"), Some(CallbackAction::Pairs(3)));
    }

    #[test]
    fn test_parse_rejects_unknown_data() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("pairs:x"), None);
        assert_eq!(CallbackAction::parse("admin:nuke"), None);
        assert_eq!(CallbackAction::parse("qc:tf:btcusdt"), None);
    }

    #[test]
    fn test_admin_actions_flagged() {
        let toggle = CallbackAction::parse("admin:toggle_wl").unwrap();
        assert_eq!(toggle, CallbackAction::Admin(AdminAction::ToggleEnforcement));
        assert!(toggle.is_admin_action());
        assert!(!CallbackAction::parse("menu:faq").unwrap().is_admin_action());
    }
}

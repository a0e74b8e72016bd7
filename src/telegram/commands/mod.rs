//! Command and input handlers
//!
//! The router in `polling` runs the access guard before anything here,
//! except for `/start`, which does its own ban/whitelist checks.

pub mod admin;
pub mod callbacks;
pub mod charts;
pub mod menu;
pub mod start;

use super::context::BotContext;
use super::state::ConversationState;
use crate::access::{normalize_username, placeholder_username};
use crate::logger::{self, LogTag};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, ParseMode, User};
use teloxide::{ApiError, RequestError};

/// Sender of an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    /// `@name`, or `ID_<id>` when the user has no public username
    pub username: String,
}

impl Actor {
    pub fn new(id: i64, username: Option<&str>) -> Self {
        let username = match username {
            Some(name) if !name.trim().is_empty() => normalize_username(name),
            _ => placeholder_username(id),
        };
        Self { id, username }
    }

    pub fn from_user(user: &User) -> Self {
        Self::new(user.id.0 as i64, user.username.as_deref())
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.username, self.id)
    }
}

/// Send an HTML message, optionally with a keyboard
pub async fn send_html(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<(), String> {
    let request = bot
        .send_message(chat_id, text.to_string())
        .parse_mode(ParseMode::Html);
    let result = match keyboard {
        Some(markup) => request.reply_markup(markup).await,
        None => request.await,
    };
    result
        .map(|_| ())
        .map_err(|e| format!("Failed to send message: {}", e))
}

/// Edit `message_id` in place, or send a new message when there is none or
/// the edit is refused
pub async fn edit_or_send(
    bot: &Bot,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<(), String> {
    if let Some(message_id) = message_id {
        match bot
            .edit_message_text(chat_id, message_id, text.to_string())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(RequestError::Api(ApiError::MessageNotModified)) => {
                logger::debug(LogTag::Telegram, "Message not modified, edit skipped");
                return Ok(());
            }
            Err(e) => {
                logger::warning(
                    LogTag::Telegram,
                    &format!("Edit of message {} failed, sending a new one: {}", message_id.0, e),
                );
            }
        }
    }
    send_html(bot, chat_id, text, Some(keyboard)).await
}

/// Plain text from an allowed user
pub async fn handle_text(
    ctx: &BotContext,
    chat_id: ChatId,
    actor: &Actor,
    text: &str,
) -> Result<(), String> {
    let state = ctx.conversations.get(chat_id.0).await;

    match state {
        Some(ConversationState::AwaitingQuery(kind)) => {
            charts::handle_query_input(ctx, chat_id, kind, text).await
        }
        Some(ConversationState::AwaitingPeriod { symbol, timeframe }) => {
            charts::handle_period_input(ctx, chat_id, &symbol, &timeframe, text).await
        }
        Some(state) if state.is_admin_step() => {
            if !ctx.is_admin(actor.id) {
                logger::warning(
                    LogTag::Access,
                    &format!("Admin input from non-admin {} dropped", actor.label()),
                );
                ctx.conversations.clear(chat_id.0).await;
                return send_html(&ctx.bot, chat_id, ctx.gate.admin_only_message(), None).await;
            }
            admin::handle_admin_input(ctx, chat_id, state, text).await
        }
        _ => {
            logger::debug(
                LogTag::Telegram,
                &format!("Text outside a conversation from {}, showing menu", actor.label()),
            );
            menu::send_main_menu(ctx, chat_id, actor.id, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_username_forms() {
        assert_eq!(Actor::new(5, Some("alice")).username, "@alice");
        assert_eq!(Actor::new(5, Some("@alice")).username, "@alice");
        assert_eq!(Actor::new(5, None).username, "ID_5");
        assert_eq!(Actor::new(5, Some("  ")).username, "ID_5");
        assert_eq!(Actor::new(5, None).label(), "ID_5 (5)");
    }
}

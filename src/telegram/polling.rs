//! Update polling and routing
//!
//! Long-polls `getUpdates` until shutdown. Each update is handled in its own
//! task. Routing order for every update except `/start`:
//!
//! 1. access guard (ban, then whitelist); on denial nothing else runs
//! 2. admin guard for admin buttons and admin input steps
//! 3. the handler

use super::commands::callbacks::{self, CallbackAction};
use super::commands::{self, start, Actor};
use super::context::BotContext;
use crate::logger::{self, LogTag};
use std::sync::Arc;
use std::time::{Duration, Instant};
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, CallbackQuery, ChatId, Message, UpdateKind};
use tokio::sync::Notify;

const POLL_TIMEOUT_SECS: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_secs(1);

pub async fn run_polling(ctx: Arc<BotContext>, shutdown: Arc<Notify>) {
    logger::info(
        LogTag::Telegram,
        &format!("Polling updates for @{}", ctx.bot_username),
    );

    let notified = shutdown.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();

    let mut offset: i32 = 0;
    loop {
        let mut request = ctx
            .bot
            .get_updates()
            .timeout(POLL_TIMEOUT_SECS)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery]);
        if offset > 0 {
            request = request.offset(offset);
        }

        let result = tokio::select! {
            _ = &mut notified => {
                logger::info(LogTag::Telegram, "Update polling stopping");
                break;
            }
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    // Update offset to next update ID to avoid reprocessing
                    offset = update.id.0 as i32 + 1;
                    let ctx = ctx.clone();
                    tokio::spawn(async move {
                        route_update(ctx, update.kind).await;
                    });
                }
            }
            Err(e) => {
                logger::debug(
                    LogTag::Telegram,
                    &format!("Poll error (will retry): {}", e),
                );
                tokio::select! {
                    _ = &mut notified => {
                        logger::info(LogTag::Telegram, "Update polling stopping");
                        break;
                    }
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }
    }
}

async fn route_update(ctx: Arc<BotContext>, kind: UpdateKind) {
    let started = Instant::now();
    let (label, result) = match kind {
        UpdateKind::Message(message) => ("message", handle_message(&ctx, message).await),
        UpdateKind::CallbackQuery(query) => ("callback", handle_callback(&ctx, query).await),
        _ => return,
    };

    if let Err(e) = result {
        logger::error(LogTag::Telegram, &format!("Failed to handle {}: {}", label, e));
    }
    logger::debug(
        LogTag::Telegram,
        &format!("Handled {} in {} ms", label, started.elapsed().as_millis()),
    );
}

fn is_start_command(text: &str) -> bool {
    matches!(
        text.split_whitespace().next(),
        Some(cmd) if cmd == "/start" || cmd.starts_with("/start@")
    )
}

async fn handle_message(ctx: &BotContext, message: Message) -> Result<(), String> {
    let Some(actor) = message.from.as_ref().map(Actor::from_user) else {
        return Ok(());
    };
    let Some(text) = message.text() else {
        logger::debug(
            LogTag::Telegram,
            &format!("Ignoring non-text message from {}", actor.label()),
        );
        return Ok(());
    };
    let chat_id = message.chat.id;

    if is_start_command(text) {
        return start::handle_start(ctx, chat_id, &actor, text).await;
    }

    let decision = ctx.gate.check(actor.id, &actor.username).await;
    if let Some(denial) = decision.denial_message() {
        ctx.conversations.clear(chat_id.0).await;
        return commands::send_html(&ctx.bot, chat_id, denial, None).await;
    }

    commands::handle_text(ctx, chat_id, &actor, text).await
}

async fn handle_callback(ctx: &BotContext, query: CallbackQuery) -> Result<(), String> {
    let actor = Actor::from_user(&query.from);
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(actor.id));
    let message_id = query.message.as_ref().map(|m| m.id());
    let data = query.data.as_deref().unwrap_or("");

    let decision = ctx.gate.check(actor.id, &actor.username).await;
    if let Some(alert) = decision.denial_alert() {
        return deny_callback(ctx, &query.id, alert).await;
    }

    let Some(action) = CallbackAction::parse(data) else {
        logger::debug(LogTag::Telegram, &format!("Unknown callback: {}", data));
        return ctx
            .bot
            .answer_callback_query(&query.id)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to answer callback: {}", e));
    };

    if action.is_admin_action() && !ctx.is_admin(actor.id) {
        logger::warning(
            LogTag::Access,
            &format!("Admin button {} pressed by {}", data, actor.label()),
        );
        return deny_callback(ctx, &query.id, ctx.gate.admin_only_message()).await;
    }

    callbacks::handle_callback_query(ctx, chat_id, message_id, &actor, &query.id, action).await
}

async fn deny_callback(ctx: &BotContext, query_id: &str, alert: &str) -> Result<(), String> {
    ctx.bot
        .answer_callback_query(query_id)
        .text(alert)
        .show_alert(true)
        .await
        .map(|_| ())
        .map_err(|e| format!("Failed to answer callback: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_command_detection() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start abc"));
        assert!(is_start_command("/start@mk_ohlcv_bot"));
        assert!(!is_start_command("/starter"));
        assert!(!is_start_command("btcusdt 5 100"));
    }
}

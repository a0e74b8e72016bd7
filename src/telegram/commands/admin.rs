//! Admin panel: referrals, whitelist, banlist, enforcement toggle, log file
//!
//! Callers must have passed the admin guard.

use super::{edit_or_send, send_html};
use crate::access::BanOutcome;
use crate::logger::{self, LogTag};
use crate::referral::parse_ttl;
use crate::telegram::context::BotContext;
use crate::telegram::formatters::{self, html_escape};
use crate::telegram::keyboards;
use crate::telegram::state::ConversationState;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, InputFile, MessageId, ParseMode};

/// Result of one admin input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminStep {
    /// Input rejected; stay on the same step
    Retry(String),
    /// Move to the next step of the wizard
    Next(ConversationState, String),
    /// Wizard finished; back to the panel
    Done(String),
}

pub async fn show_panel(ctx: &BotContext, chat_id: ChatId, message_id: Option<MessageId>) -> Result<(), String> {
    ctx.conversations.clear(chat_id.0).await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::admin_panel_text(),
        keyboards::admin_panel(ctx.registry().enforcement_enabled()),
    )
    .await
}

/// Enter an input step and show its prompt
pub async fn begin_step(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    state: ConversationState,
) -> Result<(), String> {
    let prompt = match &state {
        ConversationState::AwaitingActivations => {
            "➕ Send the number of activations for the referral link:"
        }
        ConversationState::AwaitingDeactivation => "🗑 Send the code of the referral link to remove:",
        ConversationState::AwaitingWhitelistRemoval => {
            "➖ Send the user ID or @username to remove from the whitelist:"
        }
        ConversationState::AwaitingBan => "🚫 Send the user ID to ban:",
        ConversationState::AwaitingUnban => "✅ Send the user ID to unban:",
        _ => return Err(format!("{:?} is not an admin entry step", state)),
    };
    ctx.conversations.set(chat_id.0, state).await;
    edit_or_send(&ctx.bot, chat_id, message_id, prompt, keyboards::admin_cancel()).await
}

pub async fn show_referrals(ctx: &BotContext, chat_id: ChatId, message_id: Option<MessageId>) -> Result<(), String> {
    let lines = ctx.referrals.list_active().await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::referral_list_text(&lines),
        keyboards::back_to_admin(),
    )
    .await
}

pub async fn show_whitelist(ctx: &BotContext, chat_id: ChatId, message_id: Option<MessageId>) -> Result<(), String> {
    let records = ctx.registry().whitelist().await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::user_list_text("📜 Whitelist", &records),
        keyboards::back_to_admin(),
    )
    .await
}

pub async fn show_banlist(ctx: &BotContext, chat_id: ChatId, message_id: Option<MessageId>) -> Result<(), String> {
    let records = ctx.registry().banlist().await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::user_list_text("🚫 Banlist", &records),
        keyboards::back_to_admin(),
    )
    .await
}

/// Flip enforcement; returns the alert text
pub fn toggle_enforcement(ctx: &BotContext) -> String {
    let enabled = ctx.registry().toggle_enforcement();
    if enabled {
        "Whitelist is now ON ✅".to_string()
    } else {
        "Whitelist is now OFF ❌".to_string()
    }
}

pub async fn send_log_file(ctx: &BotContext, chat_id: ChatId) -> Result<(), String> {
    logger::flush();

    let Some(path) = logger::current_log_file() else {
        return send_html(&ctx.bot, chat_id, "❌ File logging is disabled for this run.", None).await;
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if !path.exists() {
        logger::error(
            LogTag::Telegram,
            &format!("Log file {} not found", path.display()),
        );
        let text = format!("❌ Log file not found: <code>{}</code>", html_escape(&file_name));
        return send_html(&ctx.bot, chat_id, &text, None).await;
    }

    if let Err(e) = ctx
        .bot
        .send_chat_action(chat_id, ChatAction::UploadDocument)
        .await
    {
        logger::debug(LogTag::Telegram, &format!("Chat action failed: {}", e));
    }

    let caption = format!("📄 Current log file:\n<code>{}</code>", html_escape(&file_name));
    match ctx
        .bot
        .send_document(chat_id, InputFile::file(path.clone()))
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(_) => {
            logger::info(LogTag::Telegram, &format!("Log file {} sent", file_name));
            Ok(())
        }
        Err(e) => {
            logger::error(LogTag::Telegram, &format!("Failed to send log file: {}", e));
            let text = format!("❌ Could not send the log file: {}", html_escape(&e.to_string()));
            send_html(&ctx.bot, chat_id, &text, None).await
        }
    }
}

/// Apply one admin input for `state`
pub async fn process_input(ctx: &BotContext, state: &ConversationState, text: &str) -> AdminStep {
    let input = text.trim();
    let registry = ctx.registry();

    match state {
        ConversationState::AwaitingActivations => match input.parse::<i64>() {
            Ok(activations) if activations > 0 => AdminStep::Next(
                ConversationState::AwaitingTtl { activations },
                formatters::ttl_prompt(),
            ),
            Ok(_) => AdminStep::Retry("❌ The number of activations must be positive.".to_string()),
            Err(_) => AdminStep::Retry("❌ Send a whole number of activations.".to_string()),
        },
        ConversationState::AwaitingTtl { activations } => {
            let ttl = input.to_lowercase();
            if let Err(e) = parse_ttl(&ttl) {
                return AdminStep::Retry(format!(
                    "❌ {}\nUse a number plus <code>m</code>, <code>h</code> or <code>d</code>, or <code>0</code> for no expiry.\n<b>Examples:</b> <code>30m</code>, <code>2h</code>, <code>1d</code>, <code>0</code>",
                    html_escape(&e.to_string())
                ));
            }
            match ctx.referrals.generate(*activations, &ttl, &ctx.bot_username).await {
                Ok(link) => AdminStep::Done(formatters::referral_created_text(&link)),
                Err(e) => {
                    logger::error(LogTag::Referral, &format!("Referral generation failed: {}", e));
                    AdminStep::Done("❌ Failed to create the link.".to_string())
                }
            }
        }
        ConversationState::AwaitingWhitelistRemoval => {
            let shown = html_escape(input);
            if registry.remove_from_whitelist(input).await {
                AdminStep::Done(format!("✅ User <code>{}</code> removed from the whitelist.", shown))
            } else {
                AdminStep::Done(format!("⚠️ User <code>{}</code> not found in the whitelist.", shown))
            }
        }
        ConversationState::AwaitingBan => {
            let Ok(user_id) = input.parse::<i64>() else {
                return AdminStep::Retry("❌ Send a valid numeric user ID.".to_string());
            };
            let username = known_username(ctx, user_id).await;
            match registry.ban(user_id, &username).await {
                BanOutcome::Banned => {
                    AdminStep::Done(format!("🚫 User with ID <code>{}</code> banned.", user_id))
                }
                BanOutcome::AdministratorImmune => AdminStep::Done(format!(
                    "⚠️ The administrator (ID: <code>{}</code>) cannot be banned.",
                    user_id
                )),
                BanOutcome::AlreadyBanned | BanOutcome::UsernameUpdated => AdminStep::Done(format!(
                    "⚠️ User with ID <code>{}</code> was already banned.",
                    user_id
                )),
            }
        }
        ConversationState::AwaitingUnban => {
            let Ok(user_id) = input.parse::<i64>() else {
                return AdminStep::Retry("❌ Send a valid numeric user ID.".to_string());
            };
            if registry.unban_user(user_id).await {
                AdminStep::Done(format!("✅ User with ID <code>{}</code> unbanned.", user_id))
            } else {
                AdminStep::Done(format!(
                    "⚠️ User with ID <code>{}</code> not found in the banlist.",
                    user_id
                ))
            }
        }
        ConversationState::AwaitingDeactivation => {
            let shown = html_escape(input);
            if ctx.referrals.deactivate(input).await {
                AdminStep::Done(format!("✅ Referral link with code <code>{}</code> removed.", shown))
            } else {
                AdminStep::Done(format!("⚠️ Referral link with code <code>{}</code> not found.", shown))
            }
        }
        ConversationState::AwaitingQuery(_) | ConversationState::AwaitingPeriod { .. } => {
            AdminStep::Done("Nothing to do.".to_string())
        }
    }
}

/// Stored username for a banned id: the whitelist entry if there is one
async fn known_username(ctx: &BotContext, user_id: i64) -> String {
    ctx.registry()
        .whitelist()
        .await
        .into_iter()
        .find(|r| r.id == user_id)
        .map(|r| r.username)
        .unwrap_or_else(|| crate::access::placeholder_username(user_id))
}

pub async fn handle_admin_input(
    ctx: &BotContext,
    chat_id: ChatId,
    state: ConversationState,
    text: &str,
) -> Result<(), String> {
    logger::info(
        LogTag::Access,
        &format!("Admin input for {:?}: {}", state, text.trim()),
    );

    match process_input(ctx, &state, text).await {
        AdminStep::Retry(reply) => {
            send_html(&ctx.bot, chat_id, &reply, Some(keyboards::admin_cancel())).await
        }
        AdminStep::Next(next, prompt) => {
            ctx.conversations.set(chat_id.0, next).await;
            send_html(&ctx.bot, chat_id, &prompt, Some(keyboards::admin_cancel())).await
        }
        AdminStep::Done(reply) => {
            send_html(&ctx.bot, chat_id, &reply, None).await?;
            show_panel(ctx, chat_id, None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::context::test_support::{context, ADMIN_ID};

    #[tokio::test]
    async fn test_activation_step_validation() {
        let (ctx, _) = context();
        let state = ConversationState::AwaitingActivations;

        assert!(matches!(process_input(&ctx, &state, "abc").await, AdminStep::Retry(_)));
        assert!(matches!(process_input(&ctx, &state, "0").await, AdminStep::Retry(_)));
        assert!(matches!(process_input(&ctx, &state, "-3").await, AdminStep::Retry(_)));
        match process_input(&ctx, &state, " 5 ").await {
            AdminStep::Next(ConversationState::AwaitingTtl { activations }, _) => assert_eq!(activations, 5),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ttl_step_creates_link() {
        let (ctx, _) = context();
        let state = ConversationState::AwaitingTtl { activations: 3 };

        assert!(matches!(process_input(&ctx, &state, "5x").await, AdminStep::Retry(_)));
        assert!(ctx.referrals.active_codes().await.is_empty());

        match process_input(&ctx, &state, "1H").await {
            AdminStep::Done(text) => assert!(text.contains("https://t.me/mk_ohlcv_bot?start=")),
            other => panic!("unexpected step {:?}", other),
        }
        let codes = ctx.referrals.active_codes().await;
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].activations_left, 3);
        assert!(codes[0].expiration.is_some());
    }

    #[tokio::test]
    async fn test_ban_and_unban_steps() {
        let (ctx, _) = context();

        assert!(matches!(
            process_input(&ctx, &ConversationState::AwaitingBan, "@someone").await,
            AdminStep::Retry(_)
        ));

        ctx.registry().add_to_whitelist(77, "seventy").await;
        match process_input(&ctx, &ConversationState::AwaitingBan, "77").await {
            AdminStep::Done(text) => assert!(text.contains("banned")),
            other => panic!("unexpected step {:?}", other),
        }
        let banlist = ctx.registry().banlist().await;
        assert_eq!(banlist[0].username, "@seventy");

        match process_input(&ctx, &ConversationState::AwaitingBan, "77").await {
            AdminStep::Done(text) => assert!(text.contains("already banned")),
            other => panic!("unexpected step {:?}", other),
        }

        match process_input(&ctx, &ConversationState::AwaitingUnban, "77").await {
            AdminStep::Done(text) => assert!(text.contains("unbanned")),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(!ctx.registry().is_banned(77).await);
    }

    #[tokio::test]
    async fn test_admin_cannot_be_banned() {
        let (ctx, _) = context();
        match process_input(&ctx, &ConversationState::AwaitingBan, &ADMIN_ID.to_string()).await {
            AdminStep::Done(text) => assert!(text.contains("cannot be banned")),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(ctx.registry().banlist().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_banned_with_placeholder() {
        let (ctx, _) = context();
        process_input(&ctx, &ConversationState::AwaitingBan, "555").await;
        assert_eq!(ctx.registry().banlist().await[0].username, "ID_555");
    }

    #[tokio::test]
    async fn test_remove_from_whitelist_by_username() {
        let (ctx, _) = context();
        ctx.registry().add_to_whitelist(31, "carol").await;

        match process_input(&ctx, &ConversationState::AwaitingWhitelistRemoval, "@carol").await {
            AdminStep::Done(text) => assert!(text.contains("removed")),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(!ctx.registry().whitelist().await.iter().any(|r| r.id == 31));

        match process_input(&ctx, &ConversationState::AwaitingWhitelistRemoval, "@carol").await {
            AdminStep::Done(text) => assert!(text.contains("not found")),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deactivate_step() {
        let (ctx, _) = context();
        let link = ctx.referrals.generate(2, "0", &ctx.bot_username).await.unwrap();

        match process_input(&ctx, &ConversationState::AwaitingDeactivation, &link.code).await {
            AdminStep::Done(text) => assert!(text.contains("removed")),
            other => panic!("unexpected step {:?}", other),
        }
        assert!(ctx.referrals.active_codes().await.is_empty());
    }

    #[test]
    fn test_toggle_alert_text() {
        let (ctx, _) = context();
        assert_eq!(toggle_enforcement(&ctx), "Whitelist is now OFF ❌");
        assert!(!ctx.registry().enforcement_enabled());
        assert_eq!(toggle_enforcement(&ctx), "Whitelist is now ON ✅");
    }
}

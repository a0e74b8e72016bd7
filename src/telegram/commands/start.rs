//! `/start [code]`

use super::{menu, send_html, Actor};
use crate::access::AccessDecision;
use crate::logger::{self, LogTag};
use crate::telegram::context::BotContext;
use crate::telegram::formatters::html_escape;
use teloxide::types::ChatId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Banned,
    Redeemed,
    /// Code refused, but the user already has access
    CodeRefusedWhitelisted(String),
    CodeRefused(String),
    NotWhitelisted,
    Welcome,
}

/// Referral code after `/start` (or `/start@bot`), if any
pub fn start_code(text: &str) -> Option<&str> {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let command = parts.next()?;
    if command != "/start" && !command.starts_with("/start@") {
        return None;
    }
    parts.next().map(str::trim).filter(|code| !code.is_empty())
}

/// Decide the reply to `/start`
///
/// The ban check comes first so a banned user cannot redeem a code.
pub async fn resolve_start(ctx: &BotContext, actor: &Actor, code: Option<&str>) -> StartOutcome {
    let registry = ctx.registry();

    if registry.is_banned(actor.id).await {
        logger::warning(
            LogTag::Access,
            &format!("Banned user {} tried /start", actor.label()),
        );
        return StartOutcome::Banned;
    }

    if let Some(code) = code {
        logger::info(
            LogTag::Referral,
            &format!("{} arrived with referral code {}", actor.label(), code),
        );
        if ctx.referrals.redeem(code, actor.id, &actor.username).await {
            return StartOutcome::Redeemed;
        }
        if registry.is_whitelisted(actor.id).await {
            return StartOutcome::CodeRefusedWhitelisted(code.to_string());
        }
        logger::warning(
            LogTag::Referral,
            &format!("{} is not whitelisted and code {} was refused", actor.label(), code),
        );
        return StartOutcome::CodeRefused(code.to_string());
    }

    if !registry.is_whitelisted(actor.id).await {
        logger::warning(
            LogTag::Access,
            &format!("{} is not whitelisted, /start refused", actor.label()),
        );
        return StartOutcome::NotWhitelisted;
    }

    StartOutcome::Welcome
}

pub async fn handle_start(
    ctx: &BotContext,
    chat_id: ChatId,
    actor: &Actor,
    text: &str,
) -> Result<(), String> {
    logger::info(
        LogTag::Telegram,
        &format!("/start from {}: {}", actor.label(), text),
    );
    ctx.conversations.clear(chat_id.0).await;

    match resolve_start(ctx, actor, start_code(text)).await {
        StartOutcome::Banned => {
            send_denial(ctx, chat_id, AccessDecision::Banned).await
        }
        StartOutcome::NotWhitelisted => {
            send_denial(ctx, chat_id, AccessDecision::NotWhitelisted).await
        }
        StartOutcome::Redeemed => {
            send_html(
                &ctx.bot,
                chat_id,
                "✅ You have been added to the whitelist through the referral link!",
                None,
            )
            .await?;
            menu::send_main_menu(ctx, chat_id, actor.id, None).await
        }
        StartOutcome::CodeRefusedWhitelisted(code) => {
            let text = format!(
                "⚠️ Referral code <code>{}</code> is invalid or expired, but you already have access.",
                html_escape(&code)
            );
            send_html(&ctx.bot, chat_id, &text, None).await?;
            menu::send_main_menu(ctx, chat_id, actor.id, None).await
        }
        StartOutcome::CodeRefused(code) => {
            let text = format!(
                "❌ Referral code <code>{}</code> is invalid or expired. Access denied.",
                html_escape(&code)
            );
            send_html(&ctx.bot, chat_id, &text, None).await
        }
        StartOutcome::Welcome => menu::send_main_menu(ctx, chat_id, actor.id, None).await,
    }
}

async fn send_denial(ctx: &BotContext, chat_id: ChatId, decision: AccessDecision) -> Result<(), String> {
    match decision.denial_message() {
        Some(text) => send_html(&ctx.bot, chat_id, text, None).await,
        None => Ok(()),
    }
}

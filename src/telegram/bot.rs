//! Telegram bot instance creation

use crate::logger::{self, LogTag};
use teloxide::prelude::*;

/// Build the bot and validate the token with `getMe`
///
/// Returns the bot and its username (without `@`).
pub async fn connect(token: &str) -> Result<(Bot, String), String> {
    if token.trim().is_empty() {
        return Err("No bot token configured (telegram.bot_token)".to_string());
    }

    let bot = Bot::new(token.trim());
    match bot.get_me().await {
        Ok(me) => {
            let username = me.user.username.clone().unwrap_or_default();
            logger::info(
                LogTag::Telegram,
                &format!("Bot initialized: @{} (ID: {})", username, me.user.id),
            );
            Ok((bot, username))
        }
        Err(e) => {
            logger::error(
                LogTag::Telegram,
                &format!("Failed to validate bot token: {}", e),
            );
            Err(format!("Invalid bot token: {}", e))
        }
    }
}

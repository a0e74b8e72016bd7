//! Main menu and read-only views

use super::edit_or_send;
use crate::logger::{self, LogTag};
use crate::telegram::context::BotContext;
use crate::telegram::pagination::paginate;
use crate::telegram::{formatters, keyboards};
use teloxide::types::{ChatId, MessageId};

/// Show the main menu, editing `message_id` when given
pub async fn send_main_menu(
    ctx: &BotContext,
    chat_id: ChatId,
    user_id: i64,
    message_id: Option<MessageId>,
) -> Result<(), String> {
    logger::debug(LogTag::Telegram, &format!("Main menu for {}", user_id));
    let text = formatters::main_menu_text(&ctx.prices.snapshot());
    let keyboard = keyboards::main_menu(ctx.is_admin(user_id));
    edit_or_send(&ctx.bot, chat_id, message_id, &text, keyboard).await
}

pub async fn send_faq(ctx: &BotContext, chat_id: ChatId, message_id: Option<MessageId>) -> Result<(), String> {
    let url = &ctx.settings.faq_url;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::faq_text(url),
        keyboards::faq(url),
    )
    .await
}

pub async fn send_pair_page(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    page: usize,
) -> Result<(), String> {
    let symbols = &ctx.settings.charts.symbols;
    let page = paginate(symbols, ctx.settings.charts.page_size, page);
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::pair_page_text(&page),
        keyboards::pair_page(page.page, page.total_pages),
    )
    .await
}

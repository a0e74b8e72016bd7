//! Chart requests: free-form queries and the quick-chart wizard
//!
//! Input errors keep the conversation step open so the user can retry.
//! Once a request is accepted the step is cleared, the data fetched,
//! rendered to SVG and sent as a document.

use super::{edit_or_send, send_html};
use crate::candles::{parse_day_range, parse_query, CandleQuery, QueryWindow};
use crate::chart;
use crate::logger::{self, LogTag};
use crate::telegram::context::{BotContext, BotSettings};
use crate::telegram::formatters::{self, html_escape};
use crate::telegram::keyboards;
use crate::telegram::state::{ChartKind, ConversationState};
use chrono::{NaiveDate, Utc};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, InputFile, MessageId, ParseMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub symbol: String,
    pub timeframe: String,
    pub window: QueryWindow,
}

/// Validate a free-form query
///
/// Returns the request and whether the limit was clamped, or an HTML reply.
pub fn check_query(
    settings: &BotSettings,
    kind: ChartKind,
    text: &str,
) -> Result<(ChartRequest, bool), String> {
    let query = parse_query(text, settings.max_limit)
        .map_err(|e| formatters::query_format_help(&e.to_string()))?;

    if !settings.is_known_symbol(&query.symbol) {
        return Err(unknown_symbol_text(&query.symbol));
    }

    Ok((
        ChartRequest {
            kind,
            symbol: query.symbol,
            timeframe: query.timeframe,
            window: query.window,
        },
        query.limit_clamped,
    ))
}

/// Validate the quick-chart period input (two clock times on `today`)
pub fn check_period(
    settings: &BotSettings,
    symbol: &str,
    timeframe: &str,
    text: &str,
    today: NaiveDate,
) -> Result<ChartRequest, String> {
    if !settings.is_known_symbol(symbol) {
        return Err(unknown_symbol_text(symbol));
    }
    let window = parse_day_range(text, today).map_err(|e| {
        format!(
            "❌ {}\nSend two times separated by a space.\n<b>Example:</b> <code>10:00 16:30</code>",
            html_escape(&e.to_string())
        )
    })?;

    Ok(ChartRequest {
        kind: ChartKind::Candles,
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        window,
    })
}

/// API query for a window; ranges ask for `default_limit` candles
pub fn candle_query(window: &QueryWindow, default_limit: u32) -> CandleQuery {
    match window {
        QueryWindow::Latest(limit) => CandleQuery::latest(*limit),
        QueryWindow::Range { start_ms, end_ms } => {
            CandleQuery::range(default_limit, *start_ms, *end_ms)
        }
    }
}

fn unknown_symbol_text(symbol: &str) -> String {
    format!(
        "❌ Unknown pair: <code>{}</code>. See the pair list in the menu.",
        html_escape(symbol)
    )
}

// === FREE-FORM QUERY ===

pub async fn start_query(ctx: &BotContext, chat_id: ChatId, kind: ChartKind) -> Result<(), String> {
    ctx.conversations
        .set(chat_id.0, ConversationState::AwaitingQuery(kind))
        .await;
    send_html(
        &ctx.bot,
        chat_id,
        &formatters::query_prompt(kind, ctx.settings.max_limit),
        Some(keyboards::back_to_menu()),
    )
    .await
}

pub async fn handle_query_input(
    ctx: &BotContext,
    chat_id: ChatId,
    kind: ChartKind,
    text: &str,
) -> Result<(), String> {
    logger::info(
        LogTag::Telegram,
        &format!("Chart query ({}) in chat {}: {}", kind.as_str(), chat_id.0, text),
    );

    let (request, clamped) = match check_query(&ctx.settings, kind, text) {
        Ok(accepted) => accepted,
        Err(reply) => return send_html(&ctx.bot, chat_id, &reply, None).await,
    };

    if clamped {
        let notice = format!(
            "⚠️ Limit adjusted to {} (the maximum).",
            ctx.settings.max_limit
        );
        send_html(&ctx.bot, chat_id, &notice, None).await?;
    }

    ctx.conversations.clear(chat_id.0).await;
    deliver_chart(ctx, chat_id, &request).await
}

// === QUICK CHARTS ===

pub async fn show_quick_symbols(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
) -> Result<(), String> {
    ctx.conversations.clear(chat_id.0).await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::quick_symbols_text(),
        keyboards::quick_symbols(&ctx.settings.charts.quick_symbols),
    )
    .await
}

pub async fn show_quick_timeframes(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    symbol: &str,
) -> Result<(), String> {
    ctx.conversations.clear(chat_id.0).await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::quick_timeframes_text(symbol),
        keyboards::quick_timeframes(symbol, &ctx.settings.charts.quick_timeframes),
    )
    .await
}

pub async fn show_quick_period(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    symbol: &str,
    timeframe: &str,
) -> Result<(), String> {
    ctx.conversations.clear(chat_id.0).await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::quick_period_text(symbol, timeframe),
        keyboards::quick_period(symbol, timeframe, ctx.settings.charts.quick_latest_limit),
    )
    .await
}

pub async fn quick_latest(
    ctx: &BotContext,
    chat_id: ChatId,
    symbol: &str,
    timeframe: &str,
) -> Result<(), String> {
    if !ctx.settings.is_known_symbol(symbol) {
        return send_html(&ctx.bot, chat_id, &unknown_symbol_text(symbol), None).await;
    }
    let request = ChartRequest {
        kind: ChartKind::Candles,
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        window: QueryWindow::Latest(ctx.settings.charts.quick_latest_limit),
    };
    deliver_chart(ctx, chat_id, &request).await
}

pub async fn request_quick_period(
    ctx: &BotContext,
    chat_id: ChatId,
    message_id: Option<MessageId>,
    symbol: &str,
    timeframe: &str,
) -> Result<(), String> {
    ctx.conversations
        .set(
            chat_id.0,
            ConversationState::AwaitingPeriod {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
            },
        )
        .await;
    edit_or_send(
        &ctx.bot,
        chat_id,
        message_id,
        &formatters::period_prompt(symbol, timeframe),
        keyboards::quick_period_input(symbol, timeframe),
    )
    .await
}

pub async fn handle_period_input(
    ctx: &BotContext,
    chat_id: ChatId,
    symbol: &str,
    timeframe: &str,
    text: &str,
) -> Result<(), String> {
    let today = Utc::now().date_naive();
    match check_period(&ctx.settings, symbol, timeframe, text, today) {
        Ok(request) => {
            ctx.conversations.clear(chat_id.0).await;
            deliver_chart(ctx, chat_id, &request).await
        }
        Err(reply) => {
            send_html(
                &ctx.bot,
                chat_id,
                &reply,
                Some(keyboards::quick_period_input(symbol, timeframe)),
            )
            .await
        }
    }
}

// === DELIVERY ===

/// Fetch, render and send one chart
pub async fn deliver_chart(ctx: &BotContext, chat_id: ChatId, request: &ChartRequest) -> Result<(), String> {
    if let Err(e) = ctx
        .bot
        .send_chat_action(chat_id, ChatAction::UploadDocument)
        .await
    {
        logger::debug(LogTag::Telegram, &format!("Chat action failed: {}", e));
    }

    let title = formatters::chart_title(request.kind, &request.symbol, &request.timeframe, &request.window);
    let query = candle_query(&request.window, ctx.settings.default_limit);
    let size = ctx.settings.chart_size();

    let rendered = match request.kind {
        ChartKind::Candles => ctx
            .api
            .get_candles(&request.symbol, &request.timeframe, query)
            .await
            .map(|candles| chart::render_ohlc(&candles, &title, size)),
        ChartKind::Close => ctx
            .api
            .get_close_prices(&request.symbol, &request.timeframe, query)
            .await
            .map(|points| chart::render_close(&points, &title, size)),
    };

    let svg = match rendered {
        Some(Some(svg)) => svg,
        Some(None) => {
            return send_html(
                &ctx.bot,
                chat_id,
                "⚠️ Could not build a chart from the returned data.",
                Some(keyboards::back_to_menu()),
            )
            .await;
        }
        None => {
            let text = format!(
                "❌ No data from the API for <code>{}/{}</code>. Try again later or check the query.",
                html_escape(&request.symbol.to_uppercase()),
                html_escape(&request.timeframe)
            );
            return send_html(&ctx.bot, chat_id, &text, Some(keyboards::back_to_menu())).await;
        }
    };

    let path = match chart::write_chart(request.kind.as_str(), &svg).await {
        Ok(path) => path,
        Err(e) => {
            logger::error(LogTag::Chart, &format!("Failed to save chart: {}", e));
            return send_html(&ctx.bot, chat_id, "❌ Failed to prepare the chart.", None).await;
        }
    };

    let caption = formatters::chart_caption(request.kind, &request.symbol, &request.timeframe, &request.window);
    let result = ctx
        .bot
        .send_document(chat_id, InputFile::file(path.clone()))
        .caption(caption)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboards::back_to_menu())
        .await;

    if let Err(e) = tokio::fs::remove_file(&path).await {
        logger::warning(
            LogTag::Chart,
            &format!("Failed to remove chart file {}: {}", path.display(), e),
        );
    }

    match result {
        Ok(_) => {
            logger::info(
                LogTag::Telegram,
                &format!("Chart {} sent to chat {}", title, chat_id.0),
            );
            Ok(())
        }
        Err(e) => {
            logger::error(LogTag::Telegram, &format!("Failed to send chart: {}", e));
            send_html(&ctx.bot, chat_id, "❌ Failed to send the chart.", None).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn settings() -> BotSettings {
        BotSettings::from_config(&Config::default())
    }

    #[test]
    fn test_query_with_limit() {
        let (request, clamped) = check_query(&settings(), ChartKind::Close, "ETHUSDT 15 100").unwrap();
        assert_eq!(request.symbol, "ethusdt");
        assert_eq!(request.timeframe, "15");
        assert_eq!(request.window, QueryWindow::Latest(100));
        assert_eq!(request.kind, ChartKind::Close);
        assert!(!clamped);
    }

    #[test]
    fn test_query_limit_clamped() {
        let (request, clamped) = check_query(&settings(), ChartKind::Candles, "btcusdt 5 5000").unwrap();
        assert_eq!(request.window, QueryWindow::Latest(1000));
        assert!(clamped);
    }

    #[test]
    fn test_query_unknown_symbol_rejected() {
        let reply = check_query(&settings(), ChartKind::Candles, "foousdt 5 100").unwrap_err();
        assert!(reply.contains("Unknown pair"));
        assert!(reply.contains("foousdt"));
    }

    #[test]
    fn test_query_bad_format_rejected() {
        let reply = check_query(&settings(), ChartKind::Candles, "btcusdt").unwrap_err();
        assert!(reply.contains("symbol timeframe limit"));
    }

    #[test]
    fn test_period_for_today() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let request = check_period(&settings(), "btcusdt", "5", "10:00 16:30", today).unwrap();
        match request.window {
            QueryWindow::Range { start_ms, end_ms } => assert_eq!(end_ms - start_ms, 6 * 3_600_000 + 30 * 60_000),
            other => panic!("expected a range, got {:?}", other),
        }

        assert!(check_period(&settings(), "btcusdt", "5", "16:30 10:00", today).is_err());
        assert!(check_period(&settings(), "btcusdt", "5", "10:00", today).is_err());
    }

    #[test]
    fn test_range_query_uses_default_limit() {
        let query = candle_query(&QueryWindow::Range { start_ms: 1, end_ms: 2 }, 1000);
        assert_eq!(query.limit, 1000);
        assert_eq!(query.start_ts, Some(1));
        assert_eq!(query.end_ts, Some(2));

        let latest = candle_query(&QueryWindow::Latest(500), 1000);
        assert_eq!(latest.limit, 500);
        assert_eq!(latest.start_ts, None);
    }
}

//! HTML message texts
//!
//! Every message is sent with `ParseMode::Html`; user-provided values go
//! through `html_escape`.

use super::keyboards::pair_label;
use super::pagination::Page;
use super::state::ChartKind;
use crate::access::UserRecord;
use crate::candles::QueryWindow;
use crate::description::PriceSnapshot;
use crate::referral::{describe_expiry, ReferralLink};

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn main_menu_text(prices: &PriceSnapshot) -> String {
    format!(
        "Menu <b>MK_OHLCV📉📈</b>\n<b>BTC/USDT:</b> <code>{}</code>$\n<b>ETH/USDT:</b> <code>{}</code>$",
        html_escape(&prices.btc),
        html_escape(&prices.eth)
    )
}

pub fn faq_text(url: &str) -> String {
    if url.is_empty() {
        "📄 <b>FAQ</b>\n\nNo FAQ link is configured yet.".to_string()
    } else {
        format!(
            "📄 <b>FAQ and bot instructions:</b>\n<a href=\"{}\">Open FAQ</a>",
            html_escape(url)
        )
    }
}

pub fn query_prompt(kind: ChartKind, max_limit: u32) -> String {
    let what = match kind {
        ChartKind::Candles => "🕯 <b>Candles</b>",
        ChartKind::Close => "📉 <b>Close prices</b>",
    };
    format!(
        "{}\n\nSend a query in one of these forms:\n\n\
         1. <code>btcusdt 5 100</code>\n\
         2. <code>ethusdt 15 20.05.2024 10:00 - 21.05.2024 12:30</code>\n\n\
         <b>Timeframe:</b> minutes (1, 5, 15, 30, 60, 120, 240) or D for a day.\n\
         <b>Limit:</b> at most {} candles.\n\
         <b>Dates:</b> UTC.",
        what, max_limit
    )
}

pub fn query_format_help(reason: &str) -> String {
    format!(
        "❌ {}\n\nUse <code>symbol timeframe limit</code>\nor <code>symbol timeframe DD.MM.YYYY HH:MM - DD.MM.YYYY HH:MM</code>",
        html_escape(reason)
    )
}

pub fn quick_symbols_text() -> String {
    "🚀 <b>Quick charts</b>\n\nChoose a pair:".to_string()
}

pub fn quick_timeframes_text(symbol: &str) -> String {
    format!(
        "🚀 Pair: <b>{}</b>\n\nChoose a timeframe:",
        html_escape(&pair_label(symbol))
    )
}

pub fn quick_period_text(symbol: &str, timeframe: &str) -> String {
    format!(
        "🚀 Pair: <b>{}</b>, timeframe: <b>{} min</b>\n\nChoose the data range:",
        html_escape(&pair_label(symbol)),
        html_escape(timeframe)
    )
}

pub fn period_prompt(symbol: &str, timeframe: &str) -> String {
    format!(
        "Pair: <b>{}</b>, timeframe: <b>{} min</b>\n\n\
         Send the start and end time of <b>today</b> (UTC):\n\
         <code>HH:MM HH:MM</code> (or <code>HH HH:MM</code>, <code>HH HH</code>)\n\
         Time separators: <code>:</code>, <code>_</code>, <code>-</code>.\n\n\
         <b>Example:</b> <code>10:00 16:30</code>",
        html_escape(&pair_label(symbol)),
        html_escape(timeframe)
    )
}

pub fn pair_page_text(page: &Page<'_, String>) -> String {
    let mut text = format!(
        "📓 <b>Available pairs</b> ({} total, page {}/{})\n\n",
        page.total_items, page.page, page.total_pages
    );
    for symbol in page.items {
        text.push_str(&format!("• <code>{}</code>\n", html_escape(symbol)));
    }
    text
}

pub fn chart_caption(kind: ChartKind, symbol: &str, timeframe: &str, window: &QueryWindow) -> String {
    let heading = match kind {
        ChartKind::Candles => format!("🕯 {} {} min", pair_label(symbol), timeframe),
        ChartKind::Close => format!("📉 {} close prices ({} min)", pair_label(symbol), timeframe),
    };
    format!("{}\n{}", html_escape(&heading), html_escape(&window.describe()))
}

/// Plain chart title drawn into the SVG
pub fn chart_title(kind: ChartKind, symbol: &str, timeframe: &str, window: &QueryWindow) -> String {
    let what = match kind {
        ChartKind::Candles => "OHLC",
        ChartKind::Close => "Close",
    };
    format!(
        "{} {} {} min, {}",
        pair_label(symbol),
        what,
        timeframe,
        window.describe()
    )
}

pub fn admin_panel_text() -> String {
    "👑 <b>Admin panel</b>".to_string()
}

pub fn user_list_text(title: &str, records: &[UserRecord]) -> String {
    if records.is_empty() {
        return format!("<b>{}</b>\n\nThe list is empty.", html_escape(title));
    }

    let mut text = format!("<b>{}</b> ({})\n\n", html_escape(title), records.len());
    for record in records {
        text.push_str(&format!(
            "• <code>{}</code> {}\n",
            record.id,
            html_escape(&record.username)
        ));
    }
    text
}

pub fn referral_list_text(lines: &[String]) -> String {
    if lines.is_empty() {
        return "ℹ️ There are no active referral links.".to_string();
    }
    let body: Vec<String> = lines.iter().map(|l| html_escape(l)).collect();
    format!("👀 <b>Active referral links:</b>\n\n{}", body.join("\n"))
}

pub fn referral_created_text(link: &ReferralLink) -> String {
    format!(
        "✅ Referral link created:\n<code>{}</code>\nCode: <code>{}</code>\nActivations: {}, {}",
        html_escape(&link.link),
        html_escape(&link.code),
        link.activations,
        describe_expiry(link.expiration)
    )
}

pub fn ttl_prompt() -> String {
    "⏰ Send the link lifetime:\n\
     <code>5m</code> - 5 minutes\n\
     <code>1h</code> - 1 hour\n\
     <code>7d</code> - 7 days\n\
     <code>0</code> - no expiry\n\n\
     Format: number + letter (m/h/d)"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::pagination::paginate;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<b>&\"x\"</b>"), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
        assert_eq!(html_escape("@user_1"), "@user_1");
    }

    #[test]
    fn test_menu_text_shows_prices() {
        let text = main_menu_text(&PriceSnapshot {
            btc: "65000.12".to_string(),
            eth: "N/A".to_string(),
        });
        assert!(text.contains("<code>65000.12</code>$"));
        assert!(text.contains("<code>N/A</code>$"));
    }

    #[test]
    fn test_user_list_escapes_names() {
        let records = vec![UserRecord::new(1, "@a<b"), UserRecord::new(2, "ID_2")];
        let text = user_list_text("Whitelist", &records);
        assert!(text.contains("(2)"));
        assert!(text.contains("@a&lt;b"));
        assert!(text.contains("<code>2</code> ID_2"));

        assert!(user_list_text("Banlist", &[]).contains("empty"));
    }

    #[test]
    fn test_pair_page_lists_items() {
        let symbols = vec!["btcusdt".to_string(), "ethusdt".to_string()];
        let text = pair_page_text(&paginate(&symbols, 15, 1));
        assert!(text.contains("2 total, page 1/1"));
        assert!(text.contains("<code>ethusdt</code>"));
    }

    #[test]
    fn test_referral_list_empty_and_filled() {
        assert!(referral_list_text(&[]).contains("no active"));
        let text = referral_list_text(&["Code: ab12cd34, activations left: 2, unbounded".to_string()]);
        assert!(text.contains("ab12cd34"));
    }

    #[test]
    fn test_caption_mentions_window() {
        let caption = chart_caption(ChartKind::Candles, "btcusdt", "5", &QueryWindow::Latest(100));
        assert!(caption.contains("BTC/USDT 5 min"));
        assert!(caption.contains("last 100 candles"));
    }
}

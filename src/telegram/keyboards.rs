//! Inline keyboard builders
//!
//! Callback data is `section:action[:args]`, parsed back by
//! `commands::callbacks::CallbackAction::parse`.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// === HELPER FUNCTIONS ===

/// Create a callback button
fn btn(text: &str, callback_data: &str) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.to_string(), callback_data.to_string())
}

/// Create a URL button (returns a no-op button if URL is invalid)
fn url_btn(text: &str, url: &str) -> InlineKeyboardButton {
    match url.parse() {
        Ok(parsed_url) => InlineKeyboardButton::url(text.to_string(), parsed_url),
        Err(_) => InlineKeyboardButton::callback(text.to_string(), "noop".to_string()),
    }
}

fn back_to_menu_row() -> Vec<InlineKeyboardButton> {
    vec![btn("🏠 Main menu", "menu:main")]
}

// === MAIN MENU ===

pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![btn("❓ FAQ", "menu:faq")],
        vec![
            btn("🚀 Quick charts", "menu:quick"),
            btn("🕯 Candles", "query:candles"),
        ],
        vec![
            btn("📉 Close prices", "query:close"),
            btn("📓 Pairs", "pairs:1"),
        ],
    ];

    if is_admin {
        rows.push(vec![btn("👑 Admin panel", "admin:panel")]);
    }

    InlineKeyboardMarkup::new(rows)
}

pub fn back_to_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_to_menu_row()])
}

pub fn faq(url: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if !url.is_empty() {
        rows.push(vec![url_btn("📄 Open FAQ", url)]);
    }
    rows.push(back_to_menu_row());
    InlineKeyboardMarkup::new(rows)
}

// === QUICK CHARTS ===

pub fn quick_symbols(symbols: &[String]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = symbols
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|symbol| btn(&pair_label(symbol), &format!("qc:sym:{}", symbol)))
                .collect()
        })
        .collect();
    rows.push(back_to_menu_row());
    InlineKeyboardMarkup::new(rows)
}

pub fn quick_timeframes(symbol: &str, timeframes: &[String]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = timeframes
        .chunks(3)
        .map(|chunk| {
            chunk
                .iter()
                .map(|tf| btn(&format!("{} min", tf), &format!("qc:tf:{}:{}", symbol, tf)))
                .collect()
        })
        .collect();
    rows.push(vec![btn("🔙 Back (pair)", "menu:quick")]);
    rows.push(back_to_menu_row());
    InlineKeyboardMarkup::new(rows)
}

pub fn quick_period(symbol: &str, timeframe: &str, latest_limit: u32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![btn(
            &format!("📈 Last {} candles", latest_limit),
            &format!("qc:latest:{}:{}", symbol, timeframe),
        )],
        vec![btn(
            "🗓 Period (today)",
            &format!("qc:period:{}:{}", symbol, timeframe),
        )],
        vec![btn("🔙 Back (timeframe)", &format!("qc:sym:{}", symbol))],
        back_to_menu_row(),
    ])
}

/// Shown while waiting for the period input
pub fn quick_period_input(symbol: &str, timeframe: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![btn("🔙 Back (data type)", &format!("qc:tf:{}:{}", symbol, timeframe))],
        back_to_menu_row(),
    ])
}

// === PAIR LIST ===

pub fn pair_page(page: usize, total_pages: usize) -> InlineKeyboardMarkup {
    let mut nav = Vec::new();
    if page > 1 {
        nav.push(btn("⬅️ Prev", &format!("pairs:{}", page - 1)));
    }
    if total_pages > 1 {
        nav.push(btn(&format!("{}/{}", page, total_pages), "noop"));
    }
    if page < total_pages {
        nav.push(btn("Next ➡️", &format!("pairs:{}", page + 1)));
    }

    let mut rows = Vec::new();
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(back_to_menu_row());
    InlineKeyboardMarkup::new(rows)
}

// === ADMIN ===

pub fn admin_panel(enforcement_enabled: bool) -> InlineKeyboardMarkup {
    let toggle_label = if enforcement_enabled {
        "WL: ON ✅"
    } else {
        "WL: OFF ❌"
    };

    InlineKeyboardMarkup::new(vec![
        vec![
            btn("➕ Referral", "admin:create_ref"),
            btn("👀 Active refs", "admin:refs"),
            btn("🗑 Remove ref", "admin:remove_ref"),
        ],
        vec![
            btn("📜 Whitelist", "admin:whitelist"),
            btn("🚫 Banlist", "admin:banlist"),
            btn("📥 Log", "admin:log"),
        ],
        vec![
            btn("➖ Remove from WL", "admin:remove_wl"),
            btn("❌ Ban", "admin:ban"),
            btn("✅ Unban", "admin:unban"),
        ],
        vec![btn(toggle_label, "admin:toggle_wl")],
        back_to_menu_row(),
    ])
}

/// Cancel button for admin input steps
pub fn admin_cancel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![btn("🔙 Cancel", "admin:panel")]])
}

pub fn back_to_admin() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![btn("🔙 Back to admin panel", "admin:panel")]])
}

/// `btcusdt` -> `BTC/USDT`
pub fn pair_label(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    match upper.strip_suffix("USDT") {
        Some(base) if !base.is_empty() => format!("{}/USDT", base),
        _ => upper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::commands::callbacks::CallbackAction;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_admin_button_only_for_admin() {
        assert!(callback_data(&main_menu(true)).contains(&"admin:panel".to_string()));
        assert!(!callback_data(&main_menu(false)).contains(&"admin:panel".to_string()));
    }

    #[test]
    fn test_toggle_label_follows_state() {
        let label = |markup: InlineKeyboardMarkup| {
            markup
                .inline_keyboard
                .iter()
                .flatten()
                .find(|b| matches!(&b.kind, InlineKeyboardButtonKind::CallbackData(d) if d == "admin:toggle_wl"))
                .map(|b| b.text.clone())
        };
        assert_eq!(label(admin_panel(true)).as_deref(), Some("WL: ON ✅"));
        assert_eq!(label(admin_panel(false)).as_deref(), Some("WL: OFF ❌"));
    }

    #[test]
    fn test_pair_page_navigation() {
        let first = callback_data(&pair_page(1, 3));
        assert!(first.contains(&"pairs:2".to_string()));
        assert!(!first.iter().any(|d| d == "pairs:0"));

        let last = callback_data(&pair_page(3, 3));
        assert!(last.contains(&"pairs:2".to_string()));
        assert!(!last.contains(&"pairs:4".to_string()));

        let single = callback_data(&pair_page(1, 1));
        assert_eq!(single, vec!["menu:main".to_string()]);
    }

    #[test]
    fn test_every_button_parses() {
        let symbols = vec!["btcusdt".to_string(), "ethusdt".to_string()];
        let timeframes = vec!["5".to_string(), "15".to_string()];
        let markups = vec![
            main_menu(true),
            back_to_menu(),
            faq(""),
            quick_symbols(&symbols),
            quick_timeframes("btcusdt", &timeframes),
            quick_period("btcusdt", "5", 500),
            quick_period_input("btcusdt", "5"),
            pair_page(2, 3),
            admin_panel(true),
            admin_cancel(),
            back_to_admin(),
        ];

        for markup in &markups {
            for data in callback_data(markup) {
                assert!(
                    CallbackAction::parse(&data).is_some(),
                    "unparsed callback data: {}",
                    data
                );
                assert!(data.len() <= 64, "callback data too long: {}", data);
            }
        }
    }

    #[test]
    fn test_pair_label() {
        assert_eq!(pair_label("btcusdt"), "BTC/USDT");
        assert_eq!(pair_label("usdt"), "USDT");
        assert_eq!(pair_label("btceur"), "BTCEUR");
    }
}

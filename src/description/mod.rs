//! Bot description with live BTC/ETH prices
//!
//! `PriceCache` keeps the last known price per pair for the main menu.
//! `DescriptionUpdater` refreshes it on a timer and pushes the Telegram bot
//! description when a price changes.

mod cache;
mod updater;

pub use cache::{description_text, PriceCache, PriceSlot, PriceSnapshot, PLACEHOLDER};
pub use updater::{DescriptionPublisher, DescriptionUpdater};

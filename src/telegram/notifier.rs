//! Bot description publisher
//!
//! The description (shown to users before they press Start) carries the
//! cached BTC/ETH prices.

use crate::description::DescriptionPublisher;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::{ApiError, RequestError};

pub struct TelegramDescriptionPublisher {
    bot: Bot,
}

impl TelegramDescriptionPublisher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl DescriptionPublisher for TelegramDescriptionPublisher {
    async fn publish(&self, text: &str) -> Result<(), String> {
        logger::debug(LogTag::Telegram, "Setting bot description");
        match self.bot.set_my_description().description(text.to_string()).await {
            Ok(_) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                logger::debug(LogTag::Telegram, "Bot description already up to date");
                Ok(())
            }
            Err(e) => Err(format!("setMyDescription failed: {}", e)),
        }
    }
}

/// Telegram rejects a description identical to the current one
fn is_not_modified(error: &RequestError) -> bool {
    match error {
        RequestError::Api(ApiError::MessageNotModified) => true,
        RequestError::Api(ApiError::Unknown(text)) => {
            text.to_lowercase().contains("description is not modified")
        }
        _ => false,
    }
}

//! Periodic price refresh
//!
//! First refresh after a short delay, then on a fixed interval. The loop
//! exits as soon as shutdown is signalled, including mid-sleep.

use super::cache::{description_text, PriceCache, PriceSlot};
use crate::candles::CandleApiClient;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;

/// Destination of the description text
#[async_trait]
pub trait DescriptionPublisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), String>;
}

pub struct DescriptionUpdater {
    cache: Arc<PriceCache>,
    client: CandleApiClient,
    publisher: Arc<dyn DescriptionPublisher>,
    timeframe: String,
}

impl DescriptionUpdater {
    pub fn new(
        cache: Arc<PriceCache>,
        client: CandleApiClient,
        publisher: Arc<dyn DescriptionPublisher>,
        timeframe: &str,
    ) -> Self {
        Self {
            cache,
            client,
            publisher,
            timeframe: timeframe.to_string(),
        }
    }

    /// Fetch both prices and publish if needed
    pub async fn refresh_once(&self) {
        logger::debug(LogTag::Description, "Refreshing prices");
        let mut prices = [None, None];
        for (i, slot) in PriceSlot::ALL.iter().enumerate() {
            prices[i] = self
                .client
                .get_latest_candle(slot.symbol(), &self.timeframe)
                .await
                .and_then(|candle| candle.reference_price());
        }
        apply_prices(&self.cache, self.publisher.as_ref(), prices[0], prices[1]).await;
    }

    pub async fn run(self: Arc<Self>, shutdown: Arc<Notify>, initial_delay: Duration, interval: Duration) {
        logger::info(
            LogTag::Description,
            &format!("Description updater started (every {}s)", interval.as_secs()),
        );

        let notified = shutdown.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        tokio::select! {
            _ = &mut notified => {
                logger::info(LogTag::Description, "Description updater stopping");
                return;
            }
            _ = sleep(initial_delay) => {}
        }

        loop {
            self.refresh_once().await;

            tokio::select! {
                _ = &mut notified => {
                    logger::info(LogTag::Description, "Description updater stopping");
                    break;
                }
                _ = sleep(interval) => {}
            }
        }
    }
}

/// Update the cache and publish the description when it should change
///
/// Returns whether a publish was attempted.
pub(crate) async fn apply_prices(
    cache: &PriceCache,
    publisher: &dyn DescriptionPublisher,
    btc: Option<f64>,
    eth: Option<f64>,
) -> bool {
    let before = cache.snapshot();
    let btc_changed = cache.update(PriceSlot::Btc, btc);
    let eth_changed = cache.update(PriceSlot::Eth, eth);
    let snapshot = cache.snapshot();

    // A pair still unknown keeps retrying the push; two unknowns never do
    let wanted = btc_changed || eth_changed || snapshot.any_unknown();
    if !wanted {
        logger::debug(LogTag::Description, "Prices unchanged, description left as is");
        return false;
    }
    if snapshot.all_unknown() && before.all_unknown() {
        logger::info(
            LogTag::Description,
            "Both prices unknown, not touching the description",
        );
        return false;
    }

    let text = description_text(&snapshot);
    match publisher.publish(&text).await {
        Ok(()) => logger::info(
            LogTag::Description,
            &format!("Description updated: {}", text.replace('\n', " | ")),
        ),
        Err(e) => logger::error(
            LogTag::Description,
            &format!("Failed to update description: {}", e),
        ),
    }
    true
}

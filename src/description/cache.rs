use crate::logger::{self, LogTag};
use std::sync::RwLock;

/// Shown for a pair before its first successful fetch
pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSlot {
    Btc,
    Eth,
}

impl PriceSlot {
    pub const ALL: [PriceSlot; 2] = [PriceSlot::Btc, PriceSlot::Eth];

    /// API symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            PriceSlot::Btc => "btcusdt",
            PriceSlot::Eth => "ethusdt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceSlot::Btc => "BTC/USDT",
            PriceSlot::Eth => "ETH/USDT",
        }
    }

    fn index(&self) -> usize {
        match self {
            PriceSlot::Btc => 0,
            PriceSlot::Eth => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSnapshot {
    pub btc: String,
    pub eth: String,
}

impl PriceSnapshot {
    pub fn is_known(value: &str) -> bool {
        value != PLACEHOLDER
    }

    pub fn any_unknown(&self) -> bool {
        !Self::is_known(&self.btc) || !Self::is_known(&self.eth)
    }

    pub fn all_unknown(&self) -> bool {
        !Self::is_known(&self.btc) && !Self::is_known(&self.eth)
    }
}

/// Two-slot cache of formatted prices
///
/// Values are kept as two-decimal strings. A failed fetch never replaces a
/// known value with the placeholder.
#[derive(Debug, Default)]
pub struct PriceCache {
    slots: RwLock<[Option<String>; 2]>,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched price; returns true when the displayed value changed
    pub fn update(&self, slot: PriceSlot, price: Option<f64>) -> bool {
        let mut slots = match self.slots.write() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = &mut slots[slot.index()];

        match price.filter(|p| p.is_finite() && *p > 0.0) {
            Some(price) => {
                let formatted = format!("{:.2}", price);
                if current.as_deref() == Some(formatted.as_str()) {
                    return false;
                }
                logger::log_price_change(slot.label(), current.as_deref(), &formatted);
                *current = Some(formatted);
                true
            }
            None => {
                match current {
                    Some(previous) => logger::warning(
                        LogTag::Description,
                        &format!("No valid {} price, keeping {}", slot.label(), previous),
                    ),
                    None => logger::warning(
                        LogTag::Description,
                        &format!("No valid {} price yet, still {}", slot.label(), PLACEHOLDER),
                    ),
                }
                false
            }
        }
    }

    pub fn get(&self, slot: PriceSlot) -> String {
        let slots = match self.slots.read() {
            Ok(slots) => slots,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots[slot.index()]
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn snapshot(&self) -> PriceSnapshot {
        PriceSnapshot {
            btc: self.get(PriceSlot::Btc),
            eth: self.get(PriceSlot::Eth),
        }
    }
}

/// Text pushed as the bot description
pub fn description_text(snapshot: &PriceSnapshot) -> String {
    format!(
        "{} - {}$\n{} - {}$",
        PriceSlot::Btc.label(),
        snapshot.btc,
        PriceSlot::Eth.label(),
        snapshot.eth
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_placeholder() {
        let cache = PriceCache::new();
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.btc, PLACEHOLDER);
        assert!(snapshot.all_unknown());
    }

    #[test]
    fn test_change_detection_uses_two_decimals() {
        let cache = PriceCache::new();
        assert!(cache.update(PriceSlot::Btc, Some(64000.123)));
        assert!(!cache.update(PriceSlot::Btc, Some(64000.1249)));
        assert!(cache.update(PriceSlot::Btc, Some(64000.13)));
        assert_eq!(cache.get(PriceSlot::Btc), "64000.13");
    }

    #[test]
    fn test_never_regresses_to_placeholder() {
        let cache = PriceCache::new();
        cache.update(PriceSlot::Eth, Some(3100.5));
        assert!(!cache.update(PriceSlot::Eth, None));
        assert!(!cache.update(PriceSlot::Eth, Some(0.0)));
        assert!(!cache.update(PriceSlot::Eth, Some(f64::NAN)));
        assert_eq!(cache.get(PriceSlot::Eth), "3100.50");
    }

    #[test]
    fn test_description_text() {
        let snapshot = PriceSnapshot {
            btc: "64000.00".to_string(),
            eth: PLACEHOLDER.to_string(),
        };
        assert_eq!(description_text(&snapshot), "BTC/USDT - 64000.00$\nETH/USDT - N/A$");
        assert!(snapshot.any_unknown());
        assert!(!snapshot.all_unknown());
    }
}

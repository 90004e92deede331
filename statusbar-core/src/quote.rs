//! Bitcoin price quote

use serde::{Deserialize, Serialize};

use crate::currency::DisplayCurrency;

/// Latest BTC price in both supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub usd_rate: f64,
    pub eur_rate: f64,
}

impl PriceQuote {
    pub fn new(usd_rate: f64, eur_rate: f64) -> Self {
        Self { usd_rate, eur_rate }
    }

    /// Rate for the given display currency
    pub fn rate(&self, currency: DisplayCurrency) -> f64 {
        match currency {
            DisplayCurrency::Usd => self.usd_rate,
            DisplayCurrency::Eur => self.eur_rate,
        }
    }
}

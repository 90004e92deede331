//! Pure projection of the latest state into status bar text

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::currency::DisplayCurrency;
use crate::portfolio::{HoldingGroup, PortfolioSnapshot};
use crate::quote::PriceQuote;

const PORTFOLIO_EMOJI: &str = "📊";
const BTC_EMOJI: &str = "₿";

/// Column width of the holding name in menu lines
const NAME_WIDTH: usize = 20;

/// Which asset-list entries count towards the total
///
/// Strategy entries always count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetFilter {
    /// Every asset entry contributes
    #[default]
    IncludeAll,
    /// Only assets whose ticker equals the reporting currency contribute
    MatchReportingCurrency,
}

/// What gets pushed to the rendering surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub title: String,
    pub lines: Vec<String>,
    pub currency: DisplayCurrency,
}

/// Parse a server decimal string, treating anything unparsable as zero
///
/// Magnitudes beyond `Decimal::MAX` (about 7.9e28) and non-finite floats also
/// count as zero.
pub fn parse_value(raw: &str) -> Decimal {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<Decimal>() {
        return value;
    }

    match raw.parse::<f64>() {
        Ok(float) => Decimal::from_f64(float).unwrap_or_else(|| {
            debug!("Value {} is outside the decimal range, counting it as zero", raw);
            Decimal::ZERO
        }),
        Err(_) => Decimal::ZERO,
    }
}

fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return "0.00".to_string();
    }
    rounded.rescale(2);
    rounded.to_string()
}

/// Turns a snapshot, a quote and a currency into display text
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayProjector {
    asset_filter: AssetFilter,
}

impl DisplayProjector {
    pub fn new(asset_filter: AssetFilter) -> Self {
        Self { asset_filter }
    }

    pub fn asset_filter(&self) -> AssetFilter {
        self.asset_filter
    }

    /// Portfolio total in the reporting currency
    pub fn total(&self, snapshot: &PortfolioSnapshot) -> Decimal {
        snapshot
            .holdings()
            .filter(|(group, holding)| match (group, self.asset_filter) {
                (HoldingGroup::Strategy, _) => true,
                (HoldingGroup::Asset, AssetFilter::IncludeAll) => true,
                (HoldingGroup::Asset, AssetFilter::MatchReportingCurrency) => {
                    holding.ticker == snapshot.currency
                }
            })
            .fold(Decimal::ZERO, |total, (_, holding)| {
                total.saturating_add(parse_value(&holding.value))
            })
    }

    /// Status bar title, e.g. `📊 €100.50 / ₿ €60000.00`
    pub fn project(
        &self,
        snapshot: &PortfolioSnapshot,
        quote: &PriceQuote,
        currency: DisplayCurrency,
    ) -> String {
        let symbol = currency.symbol();
        format!(
            "{} {}{} / {} {}{:.2}",
            PORTFOLIO_EMOJI,
            symbol,
            format_amount(self.total(snapshot)),
            BTC_EMOJI,
            symbol,
            quote.rate(currency)
        )
    }

    /// One menu line per holding, in display order
    pub fn holding_lines(&self, snapshot: &PortfolioSnapshot, currency: DisplayCurrency) -> Vec<String> {
        let symbol = currency.symbol();
        snapshot
            .holdings()
            .map(|(_, holding)| {
                format!(
                    "{:<width$} {}{}",
                    holding.name,
                    symbol,
                    format_amount(parse_value(&holding.value)),
                    width = NAME_WIDTH
                )
            })
            .collect()
    }

    pub fn view(
        &self,
        snapshot: &PortfolioSnapshot,
        quote: &PriceQuote,
        currency: DisplayCurrency,
    ) -> StatusView {
        StatusView {
            title: self.project(snapshot, quote, currency),
            lines: self.holding_lines(snapshot, currency),
            currency,
        }
    }
}

//! Portfolio snapshot as reported by the ICONOMI balance endpoint

use serde::{Deserialize, Serialize};

/// Which list of the balance response a holding came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingGroup {
    /// Managed strategies (the `daaList`)
    Strategy,
    /// Individual assets (the `assetList`)
    Asset,
}

/// One line item of the portfolio
///
/// `balance` and `value` are kept as the decimal strings the server sends;
/// parsing happens at projection time so a malformed entry never breaks
/// decoding of the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Holding {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub ticker: String,

    /// Units held
    #[serde(default)]
    pub balance: String,

    /// Value in the reporting currency
    #[serde(default)]
    pub value: String,
}

impl Holding {
    pub fn new(
        name: impl Into<String>,
        ticker: impl Into<String>,
        balance: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            balance: balance.into(),
            value: value.into(),
        }
    }
}

/// Most recent decoded balance response
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    /// Reporting currency chosen by the server (normally the requested one)
    #[serde(default)]
    pub currency: String,

    #[serde(rename = "daaList", default)]
    pub daa_list: Vec<Holding>,

    #[serde(rename = "assetList", default)]
    pub asset_list: Vec<Holding>,
}

impl PortfolioSnapshot {
    /// All holdings in display order: strategies first, then assets
    pub fn holdings(&self) -> impl Iterator<Item = (HoldingGroup, &Holding)> {
        self.daa_list
            .iter()
            .map(|h| (HoldingGroup::Strategy, h))
            .chain(self.asset_list.iter().map(|h| (HoldingGroup::Asset, h)))
    }

    pub fn len(&self) -> usize {
        self.daa_list.len() + self.asset_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

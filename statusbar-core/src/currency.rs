//! Display currency selection

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency the status bar renders in
///
/// The `Display` form doubles as the `currency` query parameter sent to the
/// balance endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DisplayCurrency {
    Usd,
    #[default]
    Eur,
}

impl DisplayCurrency {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayCurrency::Usd => "USD",
            DisplayCurrency::Eur => "EUR",
        }
    }

    /// Currency sign placed in front of amounts
    pub fn symbol(&self) -> &'static str {
        match self {
            DisplayCurrency::Usd => "$",
            DisplayCurrency::Eur => "€",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            DisplayCurrency::Usd => DisplayCurrency::Eur,
            DisplayCurrency::Eur => DisplayCurrency::Usd,
        }
    }
}

impl fmt::Display for DisplayCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(DisplayCurrency::Usd),
            "EUR" => Ok(DisplayCurrency::Eur),
            other => Err(format!("Unsupported display currency: {}", other)),
        }
    }
}

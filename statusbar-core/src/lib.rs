//! Core types for the ICONOMI status bar
//!
//! This crate defines the shared data structures used across the status bar:
//! the decoded portfolio and price payloads, the display currency, the
//! thread-safe latest-value state, and the pure display projection.

pub mod currency;
pub mod error;
pub mod portfolio;
pub mod projector;
pub mod quote;
pub mod state;

pub use currency::DisplayCurrency;
pub use error::{FetchError, FetchResult};
pub use portfolio::{Holding, HoldingGroup, PortfolioSnapshot};
pub use projector::{parse_value, AssetFilter, DisplayProjector, StatusView};
pub use quote::PriceQuote;
pub use state::{Latest, StatusState};

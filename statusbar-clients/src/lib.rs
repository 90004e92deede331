//! Status Bar Clients - upstream HTTP access
//!
//! This crate provides:
//! - HMAC-SHA512 request signing for the ICONOMI API
//! - A shared fetch + decode + soft-fail helper
//! - The authenticated ICONOMI balance client
//! - The public Bitcoin price client (CoinGecko or CoinDesk)

pub mod fetch;
pub mod iconomi;
pub mod price;
pub mod signer;

pub use fetch::{Endpoint, Fetcher, RequestAuth, DEFAULT_REQUEST_TIMEOUT};
pub use iconomi::{BalanceClient, IconomiCredentials, BALANCE_PATH, ICONOMI_API_BASE};
pub use price::{PriceClient, PriceFeed};
pub use signer::{sign, SignedRequestContext};

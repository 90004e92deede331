//! Public Bitcoin price feed client
//!
//! CoinGecko is the canonical upstream; CoinDesk is kept as an alternate.
//!
//! | Feed      | Request                                                   | usd_rate             | eur_rate             |
//! |-----------|-----------------------------------------------------------|----------------------|----------------------|
//! | CoinGecko | `/api/v3/simple/price?ids=bitcoin&vs_currencies=usd,eur`  | `bitcoin.usd`        | `bitcoin.eur`        |
//! | CoinDesk  | `/v1/bpi/currentprice/EUR.json`                           | `bpi.USD.rate_float` | `bpi.EUR.rate_float` |

use serde::{Deserialize, Serialize};
use statusbar_core::{FetchError, FetchResult, PriceQuote};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetch::{Endpoint, Fetcher};

const COINGECKO_API_BASE: &str = "https://api.coingecko.com";
const COINGECKO_PRICE_PATH: &str = "/api/v3/simple/price";
const COINGECKO_QUERY: &[(&str, &str)] = &[("ids", "bitcoin"), ("vs_currencies", "usd,eur")];

const COINDESK_API_BASE: &str = "https://api.coindesk.com";
const COINDESK_PRICE_PATH: &str = "/v1/bpi/currentprice/EUR.json";

/// Which public feed to read the BTC price from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceFeed {
    #[default]
    Coingecko,
    Coindesk,
}

impl PriceFeed {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            PriceFeed::Coingecko => COINGECKO_API_BASE,
            PriceFeed::Coindesk => COINDESK_API_BASE,
        }
    }
}

// ============================================================================
// Response shapes
// ============================================================================

#[derive(Debug, Deserialize)]
struct CoingeckoResponse {
    bitcoin: CoingeckoRates,
}

#[derive(Debug, Deserialize)]
struct CoingeckoRates {
    usd: f64,
    eur: f64,
}

impl From<CoingeckoResponse> for PriceQuote {
    fn from(response: CoingeckoResponse) -> Self {
        PriceQuote::new(response.bitcoin.usd, response.bitcoin.eur)
    }
}

#[derive(Debug, Deserialize)]
struct CoindeskResponse {
    bpi: CoindeskIndex,
}

#[derive(Debug, Deserialize)]
struct CoindeskIndex {
    #[serde(rename = "USD")]
    usd: CoindeskRate,
    #[serde(rename = "EUR")]
    eur: CoindeskRate,
}

#[derive(Debug, Deserialize)]
struct CoindeskRate {
    rate_float: f64,
}

impl From<CoindeskResponse> for PriceQuote {
    fn from(response: CoindeskResponse) -> Self {
        PriceQuote::new(response.bpi.usd.rate_float, response.bpi.eur.rate_float)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Unauthenticated BTC/USD + BTC/EUR price client
#[derive(Debug, Clone)]
pub struct PriceClient {
    fetcher: Fetcher,
    feed: PriceFeed,
    base_url: String,
}

impl PriceClient {
    pub fn new(feed: PriceFeed, timeout: Duration) -> FetchResult<Self> {
        Ok(Self {
            fetcher: Fetcher::new(timeout)?,
            feed,
            base_url: feed.default_base_url().to_string(),
        })
    }

    /// Point the client at another host (mirror or test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn feed(&self) -> PriceFeed {
        self.feed
    }

    #[instrument(skip(self), fields(feed = ?self.feed))]
    pub async fn fetch_price(&self) -> FetchResult<PriceQuote> {
        let quote: PriceQuote = match self.feed {
            PriceFeed::Coingecko => {
                let endpoint =
                    Endpoint::new(&self.base_url, COINGECKO_PRICE_PATH).with_query(COINGECKO_QUERY);
                self.fetcher
                    .get_json::<CoingeckoResponse>(&endpoint, None)
                    .await?
                    .into()
            }
            PriceFeed::Coindesk => {
                let endpoint = Endpoint::new(&self.base_url, COINDESK_PRICE_PATH);
                self.fetcher
                    .get_json::<CoindeskResponse>(&endpoint, None)
                    .await?
                    .into()
            }
        };

        let quote = ensure_finite(quote)?;
        debug!("BTC price: USD {:.2} EUR {:.2}", quote.usd_rate, quote.eur_rate);
        Ok(quote)
    }
}

/// A NaN or infinite rate would end up in the title, so treat it as undecodable
fn ensure_finite(quote: PriceQuote) -> FetchResult<PriceQuote> {
    if quote.usd_rate.is_finite() && quote.eur_rate.is_finite() {
        Ok(quote)
    } else {
        Err(FetchError::decode(format!(
            "Non-finite BTC rate (usd={}, eur={})",
            quote.usd_rate, quote.eur_rate
        )))
    }
}

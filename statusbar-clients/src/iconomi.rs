//! Authenticated ICONOMI balance client

use reqwest::header::{HeaderMap, HeaderValue};
use statusbar_core::{DisplayCurrency, FetchError, FetchResult, PortfolioSnapshot};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::fetch::{Endpoint, Fetcher, RequestAuth};
use crate::signer::SignedRequestContext;

/// Base URL for the ICONOMI API
pub const ICONOMI_API_BASE: &str = "https://api.iconomi.com";

/// Balance endpoint path, which is also the signed path
pub const BALANCE_PATH: &str = "/v1/user/balance";

// Header names
const HEADER_API_KEY: &str = "ICN-API-KEY";
const HEADER_TIMESTAMP: &str = "ICN-TIMESTAMP";
const HEADER_SIGNATURE: &str = "ICN-SIGN";

/// API key pair for the ICONOMI user endpoints
#[derive(Clone)]
pub struct IconomiCredentials {
    pub api_key: String,
    pub secret_key: String,
}

impl IconomiCredentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Headers for a request signed at an explicit timestamp
    pub fn headers_at(&self, context: &SignedRequestContext) -> FetchResult<HeaderMap> {
        let signature = context.sign(&self.secret_key)?;

        let mut headers = HeaderMap::new();
        headers.insert(HEADER_API_KEY, header_value(&self.api_key)?);
        headers.insert(
            HEADER_TIMESTAMP,
            header_value(&context.timestamp_millis.to_string())?,
        );
        headers.insert(HEADER_SIGNATURE, header_value(&signature)?);

        Ok(headers)
    }
}

// Never print the secret
impl fmt::Debug for IconomiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconomiCredentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl RequestAuth for IconomiCredentials {
    fn headers(&self, method: &str, path: &str) -> FetchResult<HeaderMap> {
        self.headers_at(&SignedRequestContext::now(method, path))
    }
}

fn header_value(value: &str) -> FetchResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FetchError::signing(format!("Invalid header value: {}", e)))
}

/// Client for `GET /v1/user/balance`
#[derive(Debug, Clone)]
pub struct BalanceClient {
    fetcher: Fetcher,
    base_url: String,
    credentials: IconomiCredentials,
}

impl BalanceClient {
    /// Create a client, rejecting credentials that can never sign a request
    pub fn new(credentials: IconomiCredentials, timeout: Duration) -> FetchResult<Self> {
        if credentials.secret_key.is_empty() {
            return Err(FetchError::signing("Secret key is empty"));
        }
        if credentials.api_key.is_empty() {
            return Err(FetchError::signing("API key is empty"));
        }

        Ok(Self {
            fetcher: Fetcher::new(timeout)?,
            base_url: ICONOMI_API_BASE.to_string(),
            credentials,
        })
    }

    /// Point the client at another host (sandbox or test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the portfolio valued in `currency`
    #[instrument(skip(self))]
    pub async fn fetch_balance(&self, currency: DisplayCurrency) -> FetchResult<PortfolioSnapshot> {
        let query = [("currency", currency.as_str())];
        let endpoint = Endpoint::new(&self.base_url, BALANCE_PATH).with_query(&query);

        let snapshot: PortfolioSnapshot = self
            .fetcher
            .get_json(&endpoint, Some(&self.credentials as &dyn RequestAuth))
            .await?;

        debug!(
            "Decoded balance: {} strategies, {} assets ({})",
            snapshot.daa_list.len(),
            snapshot.asset_list.len(),
            snapshot.currency
        );

        Ok(snapshot)
    }
}

//! Shared GET + decode + soft-fail helper
//!
//! Both upstreams go through [`Fetcher::get_json`]: build the URL, attach
//! optional auth headers, enforce the request timeout, dump non-success
//! responses to the log and decode the body.

use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use statusbar_core::{FetchError, FetchResult};
use std::time::Duration;
use tracing::{debug, error};

/// Upper bound for a single upstream call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "iconomi-status/0.1";

/// Where a request goes
///
/// `path` is kept apart from `query` because signatures cover the path only.
#[derive(Debug, Clone, Copy)]
pub struct Endpoint<'a> {
    pub base_url: &'a str,
    pub path: &'a str,
    pub query: &'a [(&'a str, &'a str)],
}

impl<'a> Endpoint<'a> {
    pub fn new(base_url: &'a str, path: &'a str) -> Self {
        Self {
            base_url,
            path,
            query: &[],
        }
    }

    pub fn with_query(mut self, query: &'a [(&'a str, &'a str)]) -> Self {
        self.query = query;
        self
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.path)
    }
}

/// Produces authentication headers for a request
pub trait RequestAuth: Send + Sync {
    fn headers(&self, method: &str, path: &str) -> FetchResult<HeaderMap>;
}

/// HTTP client with a bounded timeout
#[derive(Debug, Clone)]
pub struct Fetcher {
    http_client: Client,
}

impl Fetcher {
    /// Build the client; failing here is fatal since every call needs the timeout
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// GET an endpoint and decode its JSON body into `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint<'_>,
        auth: Option<&dyn RequestAuth>,
    ) -> FetchResult<T> {
        let url = endpoint.url();
        let mut request = self.http_client.get(&url).query(endpoint.query);

        if let Some(auth) = auth {
            request = request.headers(auth.headers("GET", endpoint.path)?);
        }

        debug!("GET {} {:?}", url, endpoint.query);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::transport(format!("Request to {} timed out: {}", url, e))
            } else {
                FetchError::transport(format!("Request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let (dump, body) = dump_response(response).await;
            error!("Unexpected response from {}:\n{}", url, dump);
            return Err(FetchError::http_status(status.as_u16(), body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::transport(format!("Failed to read body from {}: {}", url, e)))?;

        serde_json::from_str(&body)
            .map_err(|e| FetchError::decode(format!("Failed to parse response from {}: {}", url, e)))
    }
}

/// Render status line, headers and body for diagnostics
async fn dump_response(response: Response) -> (String, String) {
    let mut dump = format!("{:?} {}\r\n", response.version(), response.status());
    for (name, value) in response.headers() {
        dump.push_str(&format!(
            "{}: {}\r\n",
            name,
            value.to_str().unwrap_or("<binary>")
        ));
    }
    dump.push_str("\r\n");

    let body = response.text().await.unwrap_or_default();
    dump.push_str(&body);

    (dump, body)
}

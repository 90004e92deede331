//! Status Service
//!
//! Owns the two polling loops (balance and price) and the render path.
//! Fetch failures are soft: they are logged, the previous value stays in
//! place and the loop waits for its next tick.

use statusbar_clients::{BalanceClient, PriceClient};
use statusbar_core::{
    DisplayCurrency, DisplayProjector, FetchError, FetchResult, StatusState, StatusView,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::surface::StatusSurface;

/// Polling intervals for the two loops
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// How often to fetch the ICONOMI balance
    pub balance_interval: Duration,
    /// How often to fetch the BTC price
    pub price_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            balance_interval: Duration::from_secs(60),
            price_interval: Duration::from_secs(60),
        }
    }
}

/// Background service keeping the status line up to date
pub struct StatusService {
    balance_client: BalanceClient,
    price_client: PriceClient,
    state: Arc<StatusState>,
    projector: DisplayProjector,
    surface: Arc<dyn StatusSurface>,
    config: PollerConfig,
    /// Wakes the balance loop early after a currency change
    balance_wake: Notify,
}

impl StatusService {
    pub fn new(
        balance_client: BalanceClient,
        price_client: PriceClient,
        state: Arc<StatusState>,
        projector: DisplayProjector,
        surface: Arc<dyn StatusSurface>,
        config: PollerConfig,
    ) -> Self {
        Self {
            balance_client,
            price_client,
            state,
            projector,
            surface,
            config,
            balance_wake: Notify::new(),
        }
    }

    pub fn state(&self) -> &Arc<StatusState> {
        &self.state
    }

    /// Project the current state and push it to the surface
    pub fn render(&self) -> StatusView {
        let snapshot = self.state.snapshot();
        let quote = self.state.quote();
        let view = self.projector.view(&snapshot, &quote, self.state.currency());

        debug!("Rendering status: {}", view.title);
        self.surface.publish(&view);
        view
    }

    /// Fetch the balance once, replacing the snapshot on success
    pub async fn refresh_balance(&self) -> FetchResult<u64> {
        let currency = self.state.currency();
        let snapshot = self.balance_client.fetch_balance(currency).await?;

        let generation = self.state.replace_snapshot(snapshot);
        self.render();
        Ok(generation)
    }

    /// Fetch the price once, replacing the quote on success
    pub async fn refresh_price(&self) -> FetchResult<u64> {
        let quote = self.price_client.fetch_price().await?;

        let generation = self.state.replace_quote(quote);
        self.render();
        Ok(generation)
    }

    /// Switch display currency, re-render at once and re-fetch the balance
    pub fn select_currency(&self, currency: DisplayCurrency) -> StatusView {
        if self.state.set_currency(currency) {
            info!("Display currency changed to {}", currency);
            self.balance_wake.notify_one();
        }
        self.render()
    }

    pub fn toggle_currency(&self) -> StatusView {
        self.select_currency(self.state.currency().toggled())
    }

    /// Spawn both polling loops on the current runtime
    pub fn start(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let balance = tokio::spawn(Arc::clone(self).run_balance_loop());
        let price = tokio::spawn(Arc::clone(self).run_price_loop());
        (balance, price)
    }

    /// Poll the balance forever
    ///
    /// Only a signing precondition failure ends the loop, since retrying
    /// cannot fix it.
    pub async fn run_balance_loop(self: Arc<Self>) {
        info!(
            "Starting balance poller with {}s interval",
            self.config.balance_interval.as_secs()
        );

        loop {
            match self.refresh_balance().await {
                Ok(generation) => debug!("Balance snapshot #{} stored", generation),
                Err(e) if !e.is_soft() => {
                    error!("Balance poller stopped: {}", e);
                    return;
                }
                Err(e) => log_soft_failure("balance", &e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.balance_interval) => {}
                _ = self.balance_wake.notified() => {
                    debug!("Balance poller woken early");
                }
            }
        }
    }

    /// Poll the price forever
    pub async fn run_price_loop(self: Arc<Self>) {
        info!(
            "Starting price poller ({:?}) with {}s interval",
            self.price_client.feed(),
            self.config.price_interval.as_secs()
        );

        loop {
            match self.refresh_price().await {
                Ok(generation) => debug!("Price quote #{} stored", generation),
                Err(e) => log_soft_failure("price", &e),
            }

            tokio::time::sleep(self.config.price_interval).await;
        }
    }
}

fn log_soft_failure(source: &str, err: &FetchError) {
    match err {
        FetchError::HttpStatus { status, .. } => {
            warn!("{} fetch rejected with status {}, keeping last value", source, status)
        }
        other => warn!("{} fetch failed, keeping last value: {}", source, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use statusbar_clients::{IconomiCredentials, PriceFeed, BALANCE_PATH};
    use statusbar_core::PriceQuote;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingSurface {
        views: Mutex<Vec<StatusView>>,
    }

    impl RecordingSurface {
        fn last_title(&self) -> Option<String> {
            self.views.lock().last().map(|v| v.title.clone())
        }
    }

    impl StatusSurface for RecordingSurface {
        fn publish(&self, view: &StatusView) {
            self.views.lock().push(view.clone());
        }
    }

    /// Fake upstream: each endpoint succeeds for its first N calls, then 500s
    #[derive(Clone)]
    struct Upstream {
        balance_hits: Arc<AtomicUsize>,
        ok_responses: usize,
        price_hits: Arc<AtomicUsize>,
        ok_prices: usize,
        currencies: Arc<Mutex<Vec<String>>>,
    }

    async fn balance(
        State(upstream): State<Upstream>,
        Query(query): Query<HashMap<String, String>>,
    ) -> axum::response::Response {
        let hit = upstream.balance_hits.fetch_add(1, Ordering::SeqCst);
        let currency = query.get("currency").cloned().unwrap_or_default();
        upstream.currencies.lock().push(currency.clone());

        if hit >= upstream.ok_responses {
            return (StatusCode::INTERNAL_SERVER_ERROR, "maintenance").into_response();
        }

        Json(serde_json::json!({
            "currency": currency,
            "daaList": [{"name": "X", "ticker": "X", "balance": "1", "value": "100.50"}],
            "assetList": []
        }))
        .into_response()
    }

    async fn price(State(upstream): State<Upstream>) -> axum::response::Response {
        let hit = upstream.price_hits.fetch_add(1, Ordering::SeqCst);
        if hit >= upstream.ok_prices {
            return (StatusCode::INTERNAL_SERVER_ERROR, "rate limited").into_response();
        }

        Json(serde_json::json!({"bitcoin": {"usd": 65000.0, "eur": 60000.0}})).into_response()
    }

    async fn spawn_upstream(ok_responses: usize) -> (String, Upstream) {
        spawn_upstream_with(ok_responses, usize::MAX).await
    }

    async fn spawn_upstream_with(ok_responses: usize, ok_prices: usize) -> (String, Upstream) {
        let upstream = Upstream {
            balance_hits: Arc::new(AtomicUsize::new(0)),
            ok_responses,
            price_hits: Arc::new(AtomicUsize::new(0)),
            ok_prices,
            currencies: Arc::new(Mutex::new(Vec::new())),
        };
        let router = Router::new()
            .route(BALANCE_PATH, get(balance))
            .route("/api/v3/simple/price", get(price))
            .with_state(upstream.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{}", addr), upstream)
    }

    fn service(
        base_url: &str,
        currency: DisplayCurrency,
        config: PollerConfig,
    ) -> (Arc<StatusService>, Arc<RecordingSurface>) {
        let timeout = Duration::from_secs(5);
        let balance_client = BalanceClient::new(IconomiCredentials::new("key", "secret"), timeout)
            .unwrap()
            .with_base_url(base_url);
        let price_client = PriceClient::new(PriceFeed::Coingecko, timeout)
            .unwrap()
            .with_base_url(base_url);
        let surface = Arc::new(RecordingSurface::default());

        let service = StatusService::new(
            balance_client,
            price_client,
            Arc::new(StatusState::new(currency)),
            DisplayProjector::default(),
            surface.clone(),
            config,
        );
        (Arc::new(service), surface)
    }

    #[tokio::test]
    async fn test_http_500_keeps_previous_snapshot() {
        let (base_url, _upstream) = spawn_upstream(1).await;
        let (service, surface) = service(&base_url, DisplayCurrency::Eur, PollerConfig::default());

        assert_eq!(service.refresh_balance().await.unwrap(), 1);
        let before = service.state().snapshot();
        let title_before = surface.last_title().unwrap();
        assert!(title_before.starts_with("📊 €100.50"), "{}", title_before);

        let err = service.refresh_balance().await.unwrap_err();
        assert_eq!(err, FetchError::http_status(500, "maintenance"));

        assert_eq!(*service.state().snapshot(), *before);
        assert_eq!(service.state().balance_generation(), 1);
        assert_eq!(surface.last_title().unwrap(), title_before);
    }

    #[tokio::test]
    async fn test_currency_toggle_rerenders_immediately() {
        let (base_url, _upstream) = spawn_upstream(usize::MAX).await;
        let (service, surface) = service(&base_url, DisplayCurrency::Usd, PollerConfig::default());

        service.refresh_price().await.unwrap();
        assert_eq!(surface.last_title().unwrap(), "📊 $0.00 / ₿ $65000.00");

        let view = service.toggle_currency();
        assert_eq!(view.currency, DisplayCurrency::Eur);
        assert_eq!(view.title, "📊 €0.00 / ₿ €60000.00");
        assert_eq!(surface.last_title().unwrap(), view.title);
    }

    #[tokio::test]
    async fn test_balance_loop_survives_failures() {
        let (base_url, upstream) = spawn_upstream(0).await;
        let config = PollerConfig {
            balance_interval: Duration::from_millis(50),
            price_interval: Duration::from_millis(50),
        };
        let (service, _surface) = service(&base_url, DisplayCurrency::Eur, config);

        let (balance_handle, price_handle) = service.start();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(upstream.balance_hits.load(Ordering::SeqCst) >= 3);
        assert_eq!(service.state().balance_generation(), 0);
        assert!(service.state().quote_generation() >= 1);
        assert!(!balance_handle.is_finished());

        balance_handle.abort();
        price_handle.abort();
    }

    #[tokio::test]
    async fn test_price_failure_keeps_previous_quote() {
        let (base_url, _upstream) = spawn_upstream_with(usize::MAX, 1).await;
        let (service, surface) = service(&base_url, DisplayCurrency::Usd, PollerConfig::default());

        assert_eq!(service.refresh_price().await.unwrap(), 1);
        let title_before = surface.last_title().unwrap();

        let err = service.refresh_price().await.unwrap_err();
        assert_eq!(err, FetchError::http_status(500, "rate limited"));

        assert_eq!(*service.state().quote(), PriceQuote::new(65000.0, 60000.0));
        assert_eq!(service.state().quote_generation(), 1);
        assert_eq!(surface.last_title().unwrap(), title_before);
    }

    #[tokio::test]
    async fn test_price_loop_survives_failures() {
        let (base_url, upstream) = spawn_upstream_with(usize::MAX, 1).await;
        let config = PollerConfig {
            balance_interval: Duration::from_secs(60),
            price_interval: Duration::from_millis(50),
        };
        let (service, _surface) = service(&base_url, DisplayCurrency::Usd, config);

        let handle = tokio::spawn(Arc::clone(&service).run_price_loop());
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(upstream.price_hits.load(Ordering::SeqCst) >= 3);
        assert_eq!(service.state().quote_generation(), 1);
        assert_eq!(*service.state().quote(), PriceQuote::new(65000.0, 60000.0));
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn test_price_loop_survives_refused_connection() {
        // Grab a free port, then close it so nothing is listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let config = PollerConfig {
            balance_interval: Duration::from_secs(60),
            price_interval: Duration::from_millis(50),
        };
        let (service, _surface) = service(&base_url, DisplayCurrency::Usd, config);
        service.state().replace_quote(PriceQuote::new(1.0, 2.0));

        let handle = tokio::spawn(Arc::clone(&service).run_price_loop());
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(*service.state().quote(), PriceQuote::new(1.0, 2.0));
        assert_eq!(service.state().quote_generation(), 1);
        assert!(!handle.is_finished());

        handle.abort();
    }

    #[tokio::test]
    async fn test_currency_change_wakes_balance_loop() {
        let (base_url, upstream) = spawn_upstream(usize::MAX).await;
        let config = PollerConfig {
            balance_interval: Duration::from_secs(60),
            price_interval: Duration::from_secs(60),
        };
        let (service, _surface) = service(&base_url, DisplayCurrency::Eur, config);

        let handle = tokio::spawn(Arc::clone(&service).run_balance_loop());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(upstream.balance_hits.load(Ordering::SeqCst), 1);

        service.select_currency(DisplayCurrency::Usd);
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(upstream.balance_hits.load(Ordering::SeqCst), 2);
        assert_eq!(*upstream.currencies.lock(), vec!["EUR".to_string(), "USD".to_string()]);
        assert_eq!(service.state().snapshot().currency, "USD");

        handle.abort();
    }

    #[tokio::test]
    async fn test_selecting_same_currency_only_renders() {
        let (base_url, _upstream) = spawn_upstream(usize::MAX).await;
        let (service, surface) = service(&base_url, DisplayCurrency::Eur, PollerConfig::default());

        let view = service.select_currency(DisplayCurrency::Eur);
        assert_eq!(view.currency, DisplayCurrency::Eur);
        assert_eq!(surface.views.lock().len(), 1);
    }
}

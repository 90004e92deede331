//! ICONOMI Status
//!
//! Polls the ICONOMI balance API and a Bitcoin price feed and keeps a one-line
//! status title up to date.

mod config;
mod terminal;

use anyhow::Context;
use clap::Parser;
use statusbar_clients::{BalanceClient, IconomiCredentials, PriceClient};
use statusbar_core::{DisplayCurrency, DisplayProjector, StatusState};
use statusbar_services::{PollerConfig, StatusService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::AppConfig;
use crate::terminal::TerminalSurface;

#[derive(Debug, Parser)]
#[command(name = "iconomi-status")]
#[command(about = "ICONOMI portfolio value and BTC price as a live status line")]
struct Cli {
    /// Path to config (default ~/.iconomi/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose-mode (log more)
    #[arg(short, long)]
    verbose: bool,

    /// Override the configured display currency (USD or EUR)
    #[arg(long)]
    currency: Option<DisplayCurrency>,

    /// Print one line per holding under the title
    #[arg(long)]
    items: bool,

    /// Fetch once, print the status line and exit
    #[arg(long)]
    once: bool,
}

/// Filter used when `RUST_LOG` is not set
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info,iconomi_status=debug"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment overrides for the keys may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the status line
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli.verbose))),
        )
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let config = AppConfig::load(&config_path)?;

    info!(
        "Starting ICONOMI status (balance every {}s, price every {}s, feed {:?})",
        config.balance_interval_secs, config.price_interval_secs, config.price_feed
    );

    let timeout = config.request_timeout();
    let balance_client = BalanceClient::new(
        IconomiCredentials::new(config.apikey.clone(), config.secretkey.clone()),
        timeout,
    )
    .context("Invalid ICONOMI credentials")?;
    let price_client =
        PriceClient::new(config.price_feed, timeout).context("Failed to create price client")?;

    let state = Arc::new(StatusState::new(cli.currency.unwrap_or(config.currency)));
    let service = Arc::new(StatusService::new(
        balance_client,
        price_client,
        state,
        DisplayProjector::new(config.asset_filter),
        Arc::new(TerminalSurface::new(cli.items)),
        PollerConfig {
            balance_interval: config.balance_interval(),
            price_interval: config.price_interval(),
        },
    ));

    if cli.once {
        let (balance, price) = tokio::join!(service.refresh_balance(), service.refresh_price());
        if let Err(e) = balance {
            warn!("Balance fetch failed: {}", e);
        }
        if let Err(e) = price {
            warn!("Price fetch failed: {}", e);
        }
        return Ok(());
    }

    let (balance_handle, price_handle) = service.start();

    let commands = Arc::clone(&service);
    tokio::spawn(async move {
        if let Err(e) = terminal::run_commands(commands).await {
            error!("Failed to read commands from stdin: {}", e);
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");

    balance_handle.abort();
    price_handle.abort();
    Ok(())
}

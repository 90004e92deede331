//! Terminal stand-in for the menu bar
//!
//! The status title goes to stdout; stdin lines play the role of the
//! currency sub-menu.

use statusbar_core::{DisplayCurrency, StatusView};
use statusbar_services::{StatusService, StatusSurface};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Prints every published view
#[derive(Debug, Default)]
pub struct TerminalSurface {
    /// Also print one line per holding
    show_items: bool,
}

impl TerminalSurface {
    pub fn new(show_items: bool) -> Self {
        Self { show_items }
    }
}

impl StatusSurface for TerminalSurface {
    fn publish(&self, view: &StatusView) {
        println!("{}", view.title);
        if self.show_items {
            print_items(view);
        }
    }
}

fn print_items(view: &StatusView) {
    for line in &view.lines {
        println!("  {}", line);
    }
    println!("  Currency: {}", view.currency);
}

/// One line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(DisplayCurrency),
    Toggle,
    Menu,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t" | "toggle" => Ok(Command::Toggle),
            "m" | "menu" => Ok(Command::Menu),
            other => other
                .parse::<DisplayCurrency>()
                .map(Command::Select)
                .map_err(|_| format!("Unknown command '{}' (try usd, eur, toggle, menu)", other)),
        }
    }
}

/// Apply commands read from stdin until it closes
pub async fn run_commands(service: Arc<StatusService>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Select(currency)) => {
                service.select_currency(currency);
            }
            Ok(Command::Toggle) => {
                service.toggle_currency();
            }
            Ok(Command::Menu) => print_items(&service.render()),
            Err(e) => warn!("{}", e),
        }
    }

    info!("stdin closed; polling continues without the currency menu");
    Ok(())
}

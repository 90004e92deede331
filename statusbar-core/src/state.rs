//! Thread-safe latest-value state shared by the pollers and the presentation layer

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::currency::DisplayCurrency;
use crate::portfolio::PortfolioSnapshot;
use crate::quote::PriceQuote;

/// Single-slot cell holding the newest value
///
/// Writers swap the whole value under the write lock; readers clone the `Arc`
/// and never observe a half-written value.
#[derive(Debug)]
pub struct Latest<T> {
    slot: RwLock<Arc<T>>,
    /// Number of successful replacements so far
    generation: AtomicU64,
}

impl<T> Latest<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: RwLock::new(Arc::new(initial)),
            generation: AtomicU64::new(0),
        }
    }

    /// Current value
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.slot.read())
    }

    /// Replace the value wholesale, returning the new generation
    pub fn replace(&self, value: T) -> u64 {
        *self.slot.write() = Arc::new(value);
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

impl<T: Default> Default for Latest<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Everything the projector needs, owned in one place
#[derive(Debug, Default)]
pub struct StatusState {
    balance: Latest<PortfolioSnapshot>,
    quote: Latest<PriceQuote>,
    currency: RwLock<DisplayCurrency>,
}

impl StatusState {
    pub fn new(currency: DisplayCurrency) -> Self {
        Self {
            balance: Latest::default(),
            quote: Latest::default(),
            currency: RwLock::new(currency),
        }
    }

    pub fn snapshot(&self) -> Arc<PortfolioSnapshot> {
        self.balance.get()
    }

    pub fn quote(&self) -> Arc<PriceQuote> {
        self.quote.get()
    }

    pub fn currency(&self) -> DisplayCurrency {
        *self.currency.read()
    }

    pub fn replace_snapshot(&self, snapshot: PortfolioSnapshot) -> u64 {
        self.balance.replace(snapshot)
    }

    pub fn replace_quote(&self, quote: PriceQuote) -> u64 {
        self.quote.replace(quote)
    }

    pub fn balance_generation(&self) -> u64 {
        self.balance.generation()
    }

    pub fn quote_generation(&self) -> u64 {
        self.quote.generation()
    }

    /// Select a display currency, returning whether it changed
    pub fn set_currency(&self, currency: DisplayCurrency) -> bool {
        let mut current = self.currency.write();
        let changed = *current != currency;
        *current = currency;
        changed
    }

    /// Flip between USD and EUR, returning the new selection
    pub fn toggle_currency(&self) -> DisplayCurrency {
        let mut current = self.currency.write();
        *current = current.toggled();
        *current
    }
}

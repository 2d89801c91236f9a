//! Per-symbol rolling statistics and the updater that feeds them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::rolling_window::RollingWindow;
use crate::types::{Bar, EventPayload, MarketEvent, Quote, Trade};

/// Everything the detectors know about one symbol.
///
/// The price window is shared by all three event kinds: quote mid prices,
/// trade prices and bar closes form a single "recent price" baseline.
#[derive(Clone, Debug)]
pub struct SymbolState {
    pub last_quote: Option<Quote>,
    pub last_trade: Option<Trade>,
    pub last_bar: Option<Bar>,

    pub last_quote_ts: Option<DateTime<Utc>>,
    pub last_trade_ts: Option<DateTime<Utc>>,
    pub last_bar_ts: Option<DateTime<Utc>>,

    pub prices: RollingWindow,
    pub spreads: RollingWindow,
    pub trade_sizes: RollingWindow,
    pub bar_volumes: RollingWindow,

    /// Total events folded into this state.
    pub events_seen: u64,
}

impl SymbolState {
    pub fn new(window_size: usize) -> Self {
        Self {
            last_quote: None,
            last_trade: None,
            last_bar: None,
            last_quote_ts: None,
            last_trade_ts: None,
            last_bar_ts: None,
            prices: RollingWindow::new(window_size),
            spreads: RollingWindow::new(window_size),
            trade_sizes: RollingWindow::new(window_size),
            bar_volumes: RollingWindow::new(window_size),
            events_seen: 0,
        }
    }

    fn on_quote(&mut self, ts: DateTime<Utc>, quote: &Quote) {
        if let Some(mid) = quote.mid_price() {
            self.prices.push(mid);
        }
        if let Some(spread) = quote.spread() {
            self.spreads.push(spread);
        }

        self.last_quote = Some(quote.clone());
        self.last_quote_ts = Some(ts);
    }

    fn on_trade(&mut self, ts: DateTime<Utc>, trade: &Trade) {
        if trade.price > 0.0 {
            self.prices.push(trade.price);
        }
        if trade.size > 0.0 {
            self.trade_sizes.push(trade.size);
        }

        self.last_trade = Some(trade.clone());
        self.last_trade_ts = Some(ts);
    }

    fn on_bar(&mut self, ts: DateTime<Utc>, bar: &Bar) {
        if bar.close > 0.0 {
            self.prices.push(bar.close);
        }
        if bar.volume > 0.0 {
            self.bar_volumes.push(bar.volume);
        }

        self.last_bar = Some(bar.clone());
        self.last_bar_ts = Some(ts);
    }

    pub fn stats(&self) -> SymbolStats {
        SymbolStats {
            events_seen: self.events_seen,
            price: WindowStats::of(&self.prices),
            spread: WindowStats::of(&self.spreads),
            trade_size: WindowStats::of(&self.trade_sizes),
            bar_volume: WindowStats::of(&self.bar_volumes),
            last_quote_ts: self.last_quote_ts,
            last_trade_ts: self.last_trade_ts,
            last_bar_ts: self.last_bar_ts,
        }
    }
}

/// Read-only summary of one rolling window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WindowStats {
    pub samples: usize,
    pub capacity: usize,
    pub mean: f64,
    pub stdev: f64,
    pub latest: Option<f64>,
}

impl WindowStats {
    pub fn of(window: &RollingWindow) -> Self {
        Self {
            samples: window.len(),
            capacity: window.capacity(),
            mean: window.mean(),
            stdev: window.population_stdev(),
            latest: window.latest(),
        }
    }
}

/// Snapshot of a symbol's baselines, detached from the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolStats {
    pub events_seen: u64,
    pub price: WindowStats,
    pub spread: WindowStats,
    pub trade_size: WindowStats,
    pub bar_volume: WindowStats,
    pub last_quote_ts: Option<DateTime<Utc>>,
    pub last_trade_ts: Option<DateTime<Utc>>,
    pub last_bar_ts: Option<DateTime<Utc>>,
}

/// Symbol → state map. Entries are created on first sight and never removed.
#[derive(Debug)]
pub struct SymbolStateStore {
    symbols: HashMap<String, SymbolState>,
    window_size: usize,
}

impl SymbolStateStore {
    pub fn new(window_size: usize) -> Self {
        Self {
            symbols: HashMap::new(),
            window_size,
        }
    }

    /// Fold a batch of events into the store.
    ///
    /// Returns the distinct symbols touched by the batch, in first-seen order.
    /// Events without a symbol are dropped.
    pub fn apply(&mut self, events: &[MarketEvent]) -> Vec<String> {
        let mut touched: Vec<String> = Vec::new();

        for ev in events {
            if ev.symbol.is_empty() {
                debug!(ts = %ev.ts, "dropping event without symbol");
                continue;
            }

            let window_size = self.window_size;
            let state = self
                .symbols
                .entry(ev.symbol.clone())
                .or_insert_with(|| SymbolState::new(window_size));

            match &ev.payload {
                EventPayload::Quote(q) => state.on_quote(ev.ts, q),
                EventPayload::Trade(t) => state.on_trade(ev.ts, t),
                EventPayload::Bar(b) => state.on_bar(ev.ts, b),
            }
            state.events_seen += 1;

            if !touched.iter().any(|s| s == &ev.symbol) {
                touched.push(ev.symbol.clone());
            }
        }

        touched
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolState> {
        self.symbols.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Tracked symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = self.symbols.keys().cloned().collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Direct access for tests that need a hand-built baseline.
    #[cfg(test)]
    pub(crate) fn with_state_mut(&mut self, symbol: &str, f: impl FnOnce(&mut SymbolState)) {
        if let Some(state) = self.symbols.get_mut(symbol) {
            f(state);
        }
    }
}

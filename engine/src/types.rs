//! Decoded market events consumed by the engine.
//!
//! These are produced by a feed adapter and never mutated afterwards. The engine
//! does not care how they arrived; it only relies on the positivity checks done
//! by the state updater.

use chrono::{DateTime, Utc};

/// Top-of-book quote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Quote {
    pub bid_exchange: String,
    pub bid_price: f64,
    pub bid_size: f64,
    pub ask_exchange: String,
    pub ask_price: f64,
    pub ask_size: f64,
    pub conditions: Vec<String>,
    pub tape: String,
}

impl Quote {
    /// Mid price, only defined when both sides are positive.
    pub fn mid_price(&self) -> Option<f64> {
        if self.bid_price > 0.0 && self.ask_price > 0.0 {
            Some((self.bid_price + self.ask_price) / 2.0)
        } else {
            None
        }
    }

    /// Bid-ask spread, only defined for a positive, non-crossed book.
    pub fn spread(&self) -> Option<f64> {
        if self.bid_price > 0.0 && self.ask_price > 0.0 && self.ask_price >= self.bid_price {
            Some(self.ask_price - self.bid_price)
        } else {
            None
        }
    }
}

/// Single executed trade print.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trade {
    pub id: Option<u64>,
    pub price: f64,
    pub size: f64,
    pub exchange: String,
    pub conditions: Vec<String>,
    pub tape: String,
}

/// Which bar stream a bar came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BarKind {
    /// Regular minute bar.
    #[default]
    Minute,
    /// Correction of an already published minute bar (late trades).
    Updated,
    /// Running daily bar.
    Daily,
}

/// OHLCV bar.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bar {
    pub kind: BarKind,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: u64,
    pub vwap: Option<f64>,
}

impl Bar {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body(&self) -> f64 {
        self.close - self.open
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventPayload {
    Quote(Quote),
    Trade(Trade),
    Bar(Bar),
}

/// A decoded market event for one symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketEvent {
    pub symbol: String,
    pub ts: DateTime<Utc>,
    pub payload: EventPayload,
}

impl MarketEvent {
    pub fn quote(symbol: impl Into<String>, ts: DateTime<Utc>, quote: Quote) -> Self {
        Self {
            symbol: symbol.into(),
            ts,
            payload: EventPayload::Quote(quote),
        }
    }

    pub fn trade(symbol: impl Into<String>, ts: DateTime<Utc>, trade: Trade) -> Self {
        Self {
            symbol: symbol.into(),
            ts,
            payload: EventPayload::Trade(trade),
        }
    }

    pub fn bar(symbol: impl Into<String>, ts: DateTime<Utc>, bar: Bar) -> Self {
        Self {
            symbol: symbol.into(),
            ts,
            payload: EventPayload::Bar(bar),
        }
    }
}

//! Wire shapes of the market data stream.
//!
//! Numeric fields missing from a message decode as zero, string fields as empty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuoteMsg {
    #[serde(rename = "S", default)]
    pub symbol: String,
    #[serde(rename = "bx", default)]
    pub bid_exchange: String,
    #[serde(rename = "bp", default)]
    pub bid_price: f64,
    #[serde(rename = "bs", default)]
    pub bid_size: f64,
    #[serde(rename = "ax", default)]
    pub ask_exchange: String,
    #[serde(rename = "ap", default)]
    pub ask_price: f64,
    #[serde(rename = "as", default)]
    pub ask_size: f64,
    #[serde(rename = "c", default)]
    pub conditions: Vec<String>,
    #[serde(rename = "z", default)]
    pub tape: String,
    #[serde(rename = "t", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TradeMsg {
    #[serde(rename = "S", default)]
    pub symbol: String,
    #[serde(rename = "i", default)]
    pub id: Option<u64>,
    #[serde(rename = "x", default)]
    pub exchange: String,
    #[serde(rename = "p", default)]
    pub price: f64,
    #[serde(rename = "s", default)]
    pub size: f64,
    #[serde(rename = "c", default)]
    pub conditions: Vec<String>,
    #[serde(rename = "z", default)]
    pub tape: String,
    #[serde(rename = "t", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BarMsg {
    #[serde(rename = "S", default)]
    pub symbol: String,
    #[serde(rename = "o", default)]
    pub open: f64,
    #[serde(rename = "h", default)]
    pub high: f64,
    #[serde(rename = "l", default)]
    pub low: f64,
    #[serde(rename = "c", default)]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
    #[serde(rename = "n", default)]
    pub trade_count: u64,
    #[serde(rename = "vw", default)]
    pub vwap: Option<f64>,
    #[serde(rename = "t", default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorMsg {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: String,
}

/// Symbol lists, used both to request channels and to read the server's ack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub trades: Vec<String>,
    #[serde(default)]
    pub quotes: Vec<String>,
    #[serde(default)]
    pub bars: Vec<String>,
}

impl Subscription {
    /// Subscribe `symbols` to all three channels.
    pub fn all(symbols: &[String]) -> Self {
        Self {
            trades: symbols.to_vec(),
            quotes: symbols.to_vec(),
            bars: symbols.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.quotes.is_empty() && self.bars.is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request<'a> {
    Auth { key: &'a str, secret: &'a str },
    Subscribe(&'a Subscription),
}

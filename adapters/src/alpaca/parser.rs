//! Market data stream parser.
//!
//! Every WebSocket frame carries a JSON array of messages (a bare object is
//! accepted as well). Each message is tagged by `"T"`:
//!
//! - **success** / **error** / **subscription** – control traffic of the handshake
//! - **q** – quote, **t** – trade
//! - **b** / **u** / **d** – minute, updated and daily bars
//!
//! ```jsonc
//! [
//!   { "T": "t", "S": "AAPL", "i": 96921, "x": "D", "p": 126.55, "s": 1,
//!     "t": "2021-02-22T15:51:44.208Z", "c": ["@", "I"], "z": "C" }
//! ]
//! ```
//!
//! Invalid JSON is an error. Market messages without a symbol or timestamp,
//! or whose fields have the wrong type, are dropped on their own without
//! affecting the rest of the frame. Unrecognised tags surface as
//! [`StreamMessage::Unknown`] for forward compatibility.

use chrono::{DateTime, Utc};
use engine::{Bar, BarKind, MarketEvent, Quote, Trade};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::types::{BarMsg, ErrorMsg, QuoteMsg, Subscription, TradeMsg};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// `{"T":"success","msg":"connected"}` and `"authenticated"`.
    Success(String),
    Error(ErrorMsg),
    Subscription(Subscription),
    Event(MarketEvent),
    Unknown(Value),
}

pub fn parse_frame(raw: &str) -> anyhow::Result<Vec<StreamMessage>> {
    let json: Value = serde_json::from_str(raw)?;

    let items = match json {
        Value::Array(items) => items,
        other => vec![other],
    };

    Ok(items.into_iter().filter_map(parse_message).collect())
}

/// Decode a frame and keep only its market events, in frame order.
pub fn parse_events(raw: &str) -> anyhow::Result<Vec<MarketEvent>> {
    Ok(parse_frame(raw)?
        .into_iter()
        .filter_map(|m| match m {
            StreamMessage::Event(ev) => Some(ev),
            _ => None,
        })
        .collect())
}

fn parse_message(msg: Value) -> Option<StreamMessage> {
    if !msg.is_object() {
        debug!(%msg, "skipping non-object message");
        return None;
    }

    let tag = msg.get("T").and_then(Value::as_str).unwrap_or_default();

    match tag {
        "success" => {
            let text = msg.get("msg").and_then(Value::as_str).unwrap_or_default();
            Some(StreamMessage::Success(text.to_string()))
        }
        "error" => decode::<ErrorMsg>(msg).map(StreamMessage::Error),
        "subscription" => decode::<Subscription>(msg).map(StreamMessage::Subscription),
        "q" => decode::<QuoteMsg>(msg).and_then(quote_event),
        "t" => decode::<TradeMsg>(msg).and_then(trade_event),
        "b" => decode::<BarMsg>(msg).and_then(|b| bar_event(b, BarKind::Minute)),
        "u" => decode::<BarMsg>(msg).and_then(|b| bar_event(b, BarKind::Updated)),
        "d" => decode::<BarMsg>(msg).and_then(|b| bar_event(b, BarKind::Daily)),
        _ => Some(StreamMessage::Unknown(msg)),
    }
}

fn decode<T: DeserializeOwned>(msg: Value) -> Option<T> {
    match serde_json::from_value(msg) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(error = %e, "dropping malformed message");
            None
        }
    }
}

/// Symbol and timestamp are required to address an event.
fn addressed(symbol: String, ts: Option<DateTime<Utc>>) -> Option<(String, DateTime<Utc>)> {
    if symbol.is_empty() {
        debug!("dropping message without symbol");
        return None;
    }
    let Some(ts) = ts else {
        debug!(%symbol, "dropping message without timestamp");
        return None;
    };
    Some((symbol, ts))
}

fn quote_event(q: QuoteMsg) -> Option<StreamMessage> {
    let (symbol, ts) = addressed(q.symbol, q.timestamp)?;
    let quote = Quote {
        bid_exchange: q.bid_exchange,
        bid_price: q.bid_price,
        bid_size: q.bid_size,
        ask_exchange: q.ask_exchange,
        ask_price: q.ask_price,
        ask_size: q.ask_size,
        conditions: q.conditions,
        tape: q.tape,
    };
    Some(StreamMessage::Event(MarketEvent::quote(symbol, ts, quote)))
}

fn trade_event(t: TradeMsg) -> Option<StreamMessage> {
    let (symbol, ts) = addressed(t.symbol, t.timestamp)?;
    let trade = Trade {
        id: t.id,
        price: t.price,
        size: t.size,
        exchange: t.exchange,
        conditions: t.conditions,
        tape: t.tape,
    };
    Some(StreamMessage::Event(MarketEvent::trade(symbol, ts, trade)))
}

fn bar_event(b: BarMsg, kind: BarKind) -> Option<StreamMessage> {
    let (symbol, ts) = addressed(b.symbol, b.timestamp)?;
    let bar = Bar {
        kind,
        open: b.open,
        high: b.high,
        low: b.low,
        close: b.close,
        volume: b.volume,
        trade_count: b.trade_count,
        vwap: b.vwap,
    };
    Some(StreamMessage::Event(MarketEvent::bar(symbol, ts, bar)))
}

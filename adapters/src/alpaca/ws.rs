use std::time::Duration;

use engine::MarketEvent;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
};
use tracing::{debug, info, warn};

use super::parser::{StreamMessage, parse_frame};
use super::types::{Request, Subscription};
use crate::error::AdapterError;

pub const DEFAULT_STREAM_URL: &str = "wss://stream.data.alpaca.markets/v2/iex";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct AlpacaConfig {
    pub url: String,
    pub key: String,
    pub secret: String,
    pub subscription: Subscription,
    pub reconnect_delay: Duration,
}

/// How a connected session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Socket closed or failed; worth reconnecting.
    Disconnected,
    /// Nobody is listening for batches anymore.
    ReceiverGone,
}

/// Client for the market data WebSocket stream.
///
/// This client:
/// - authenticates with key and secret, then subscribes to trades, quotes and bars
/// - decodes each frame into one batch of [`MarketEvent`]s
/// - forwards batches into an mpsc channel, waiting when the channel is full
/// - reconnects after `reconnect_delay` when the socket drops
///
/// A rejected handshake is fatal. The loop ends cleanly once the receiver is dropped.
pub struct AlpacaWsClient {
    config: AlpacaConfig,
}

impl AlpacaWsClient {
    pub fn new(config: AlpacaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlpacaConfig {
        &self.config
    }

    pub async fn run_ws_loop(&self, sender: Sender<Vec<MarketEvent>>) -> anyhow::Result<()> {
        loop {
            info!(url = %self.config.url, "connecting to market data stream");

            match connect_async(self.config.url.as_str()).await {
                Ok((ws, _)) => {
                    info!("market data stream connected");
                    let (mut write, mut read) = ws.split();

                    match self.run_session(&mut write, &mut read, &sender).await? {
                        SessionEnd::ReceiverGone => {
                            info!("event receiver dropped, stopping stream");
                            return Ok(());
                        }
                        SessionEnd::Disconnected => {}
                    }
                }
                Err(e) => warn!(error = %e, "market data connection failed"),
            }

            if sender.is_closed() {
                return Ok(());
            }

            info!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "reconnecting to market data stream"
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Handshake, then pump frames until the socket or the receiver goes away.
    ///
    /// Only a rejected handshake is returned as an error.
    pub async fn run_session<W, R>(
        &self,
        write: &mut W,
        read: &mut R,
        sender: &Sender<Vec<MarketEvent>>,
    ) -> Result<SessionEnd, AdapterError>
    where
        W: Sink<Message, Error = tungstenite::Error> + Unpin,
        R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        if !expect_success(read, "connected").await? {
            return Ok(SessionEnd::Disconnected);
        }

        let auth = Request::Auth {
            key: &self.config.key,
            secret: &self.config.secret,
        };
        if !send_request(write, &auth).await? {
            return Ok(SessionEnd::Disconnected);
        }
        if !expect_success(read, "authenticated").await? {
            return Ok(SessionEnd::Disconnected);
        }
        info!("market data stream authenticated");

        if !send_request(write, &Request::Subscribe(&self.config.subscription)).await? {
            return Ok(SessionEnd::Disconnected);
        }

        while let Some(msg) = read.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(frame)) => {
                    info!(?frame, "market data stream closed by server");
                    return Ok(SessionEnd::Disconnected);
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "market data stream error");
                    return Ok(SessionEnd::Disconnected);
                }
            };

            let messages = match parse_frame(text.as_str()) {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "unparseable frame");
                    continue;
                }
            };

            let mut batch = Vec::new();
            for m in messages {
                match m {
                    StreamMessage::Event(ev) => batch.push(ev),
                    StreamMessage::Subscription(s) => info!(
                        trades = s.trades.len(),
                        quotes = s.quotes.len(),
                        bars = s.bars.len(),
                        "subscription confirmed"
                    ),
                    StreamMessage::Error(e) => {
                        warn!(code = ?e.code, msg = %e.msg, "stream reported error")
                    }
                    StreamMessage::Success(msg) => debug!(%msg, "stream status"),
                    StreamMessage::Unknown(v) => debug!(%v, "unknown stream message"),
                }
            }

            if batch.is_empty() {
                continue;
            }

            debug!(events = batch.len(), "forwarding batch");
            if sender.send(batch).await.is_err() {
                return Ok(SessionEnd::ReceiverGone);
            }
        }

        warn!("market data stream ended");
        Ok(SessionEnd::Disconnected)
    }
}

/// Read until the server reports `expected`. `Ok(false)` means the socket went away.
async fn expect_success<R>(read: &mut R, expected: &'static str) -> Result<bool, AdapterError>
where
    R: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = read.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return Ok(false),
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, stage = expected, "stream error during handshake");
                return Ok(false);
            }
        };

        let messages = match parse_frame(text.as_str()) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, stage = expected, "unparseable handshake frame");
                continue;
            }
        };

        for m in messages {
            match m {
                StreamMessage::Success(msg) if msg == expected => return Ok(true),
                StreamMessage::Error(e) => {
                    return Err(AdapterError::Rejected {
                        stage: expected,
                        code: e.code,
                        msg: e.msg,
                    });
                }
                other => debug!(?other, stage = expected, "ignoring handshake message"),
            }
        }
    }

    Ok(false)
}

/// `Ok(false)` means the socket refused the write.
async fn send_request<W>(write: &mut W, req: &Request<'_>) -> Result<bool, AdapterError>
where
    W: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(req)?;
    match write.send(Message::Text(text.into())).await {
        Ok(()) => Ok(true),
        Err(e) => {
            warn!(error = %e, "failed to send request");
            Ok(false)
        }
    }
}

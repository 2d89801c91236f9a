//! Outbound hand-off for emitted anomalies.
//!
//! Sinks are called by the engine while it still holds its lock, right after
//! the anomaly was appended to the history. They must return quickly and never
//! block: push to a channel, log, bump a counter.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::warn;

use crate::anomaly::Anomaly;

pub trait AnomalySink: Send + Sync {
    fn on_anomaly(&self, anomaly: &Anomaly);
}

impl<F> AnomalySink for F
where
    F: Fn(&Anomaly) + Send + Sync,
{
    fn on_anomaly(&self, anomaly: &Anomaly) {
        self(anomaly)
    }
}

/// Emits each anomaly as a structured `WARN` event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl AnomalySink for LogSink {
    fn on_anomaly(&self, a: &Anomaly) {
        warn!(
            symbol = %a.symbol,
            kind = ?a.kind,
            direction = ?a.direction,
            value = a.value,
            mean = a.mean,
            stdev = a.stdev,
            zscore = a.zscore,
            ts = %a.timestamp,
            "{}",
            a.note
        );
    }
}

/// Forwards anomalies into a bounded tokio channel without waiting.
///
/// When the channel is full or closed the anomaly is dropped and counted.
pub struct ChannelSink {
    tx: mpsc::Sender<Anomaly>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Anomaly>) -> Self {
        Self {
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AnomalySink for ChannelSink {
    fn on_anomaly(&self, anomaly: &Anomaly) {
        if let Err(e) = self.tx.try_send(anomaly.clone()) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            let reason = match e {
                TrySendError::Full(_) => "full",
                TrySendError::Closed(_) => "closed",
            };
            warn!(symbol = %anomaly.symbol, reason, "anomaly channel rejected record");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::anomaly::{AnomalyKind, Direction, Source};

    fn anomaly(symbol: &str) -> Anomaly {
        Anomaly {
            kind: AnomalyKind::Volume,
            source: Source::Bar,
            direction: Direction::Down,
            symbol: symbol.into(),
            timestamp: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            value: 1.0,
            mean: 10.0,
            stdev: 2.0,
            zscore: -4.5,
            lower: 6.0,
            upper: 14.0,
            k: 2.0,
            note: "Downward volume anomaly".into(),
        }
    }

    #[test]
    fn channel_sink_forwards_until_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let sink = ChannelSink::new(tx);

        sink.on_anomaly(&anomaly("A"));
        sink.on_anomaly(&anomaly("B"));

        assert_eq!(rx.try_recv().unwrap().symbol, "A");
        assert!(rx.try_recv().is_err());
        assert_eq!(sink.dropped(), 1);
    }

    #[test]
    fn channel_sink_counts_closed_receiver() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sink = ChannelSink::new(tx);

        sink.on_anomaly(&anomaly("A"));

        assert_eq!(sink.dropped(), 1);
    }

    #[tracing_test::traced_test]
    #[test]
    fn log_sink_emits_note() {
        LogSink.on_anomaly(&anomaly("SPY"));

        assert!(logs_contain("Downward volume anomaly"));
        assert!(logs_contain("SPY"));
    }

    #[test]
    fn closures_are_sinks() {
        let seen = std::sync::Mutex::new(Vec::new());
        let sink = |a: &Anomaly| seen.lock().unwrap().push(a.symbol.clone());

        sink.on_anomaly(&anomaly("X"));

        assert_eq!(*seen.lock().unwrap(), vec!["X".to_string()]);
    }
}

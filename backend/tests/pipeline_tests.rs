use std::sync::Arc;

use adapters::alpaca::{MarketDataProvider, parser::parse_events};
use async_trait::async_trait;
use backend::pipeline::{run_feed, run_ingest_loop};
use engine::{AnomalyEngine, AnomalyKind, EngineConfig, MarketEvent};
use tokio::sync::mpsc::{self, Sender};

/// Replays raw frames through the real parser, one batch per frame.
struct ReplayProvider {
    frames: Vec<String>,
}

#[async_trait]
impl MarketDataProvider for ReplayProvider {
    async fn stream_events(&self, sender: Sender<Vec<MarketEvent>>) -> anyhow::Result<()> {
        for frame in &self.frames {
            let batch = parse_events(frame)?;
            if sender.send(batch).await.is_err() {
                break;
            }
        }
        Ok(())
    }
}

struct FailingProvider;

#[async_trait]
impl MarketDataProvider for FailingProvider {
    async fn stream_events(&self, _sender: Sender<Vec<MarketEvent>>) -> anyhow::Result<()> {
        anyhow::bail!("feed rejected authenticated: auth failed")
    }
}

fn trade_frame(i: usize, price: f64) -> String {
    format!(
        r#"[{{"T":"t","S":"AAPL","i":{i},"p":{price},"s":10,"t":"2024-03-01T14:30:{:02}Z"}}]"#,
        i % 60
    )
}

#[tokio::test]
async fn replayed_feed_reaches_the_engine() {
    let mut frames: Vec<String> = (0..20)
        .map(|i| trade_frame(i, if i % 2 == 0 { 99.0 } else { 101.0 }))
        .collect();
    frames.push(trade_frame(20, 105.0));

    let engine = Arc::new(AnomalyEngine::new(EngineConfig::default()).unwrap());
    // small buffer: the feed has to wait for the ingest loop
    let (tx, rx) = mpsc::channel(2);

    let ingest = tokio::spawn(run_ingest_loop(engine.clone(), rx));
    run_feed(Arc::new(ReplayProvider { frames }), tx).await.unwrap();

    assert_eq!(ingest.await.unwrap(), 21);

    let anomalies = engine.recent_anomalies(None);
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].kind, AnomalyKind::Price);
    assert_eq!(anomalies[0].value, 105.0);
    assert_eq!(engine.counters().events, 21);
}

#[tokio::test]
async fn empty_batches_are_still_counted() {
    let engine = Arc::new(AnomalyEngine::new(EngineConfig::default()).unwrap());
    let (tx, rx) = mpsc::channel(4);

    let ingest = tokio::spawn(run_ingest_loop(engine.clone(), rx));
    tx.send(Vec::new()).await.unwrap();
    drop(tx);

    assert_eq!(ingest.await.unwrap(), 1);
    assert!(engine.symbols().is_empty());
}

#[tokio::test]
async fn feed_failure_is_returned() {
    let (tx, _rx) = mpsc::channel(1);

    let err = run_feed(Arc::new(FailingProvider), tx).await.unwrap_err();

    assert!(err.to_string().contains("auth failed"));
}

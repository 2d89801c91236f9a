use std::sync::Arc;

use adapters::alpaca::provider::AlpacaProvider;
use backend::{
    api::run_api_server,
    config::AppConfig,
    pipeline::{run_feed, run_ingest_loop},
};
use clap::Parser;
use common::logger::init_logger;
use engine::{AnomalyEngine, LogSink};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::parse();
    init_logger("anomaly-watch", cfg.json_logs());

    info!("Starting anomaly engine...");
    cfg.validate()?;

    let engine = Arc::new(AnomalyEngine::new(cfg.engine_config())?.with_sink(Arc::new(LogSink)));

    let (event_tx, event_rx) = mpsc::channel(cfg.channel_capacity);

    let provider = Arc::new(AlpacaProvider::new(cfg.alpaca_config()));
    let mut feed = tokio::spawn(run_feed(provider, event_tx));
    let ingest = tokio::spawn(run_ingest_loop(engine.clone(), event_rx));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut api = tokio::spawn(run_api_server(cfg.http_addr, engine.clone(), async move {
        let _ = stop_rx.await;
    }));

    let mut api_done = false;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("Shutdown signal received");
        }
        res = &mut feed => match res {
            Ok(Ok(())) => info!("feed finished"),
            Ok(Err(e)) => error!(error = ?e, "feed terminated"),
            Err(e) => error!(error = ?e, "feed task panicked"),
        },
        res = &mut api => {
            api_done = true;
            match res {
                Ok(Ok(())) => info!("api server finished"),
                Ok(Err(e)) => error!(error = ?e, "api server terminated"),
                Err(e) => error!(error = ?e, "api server task panicked"),
            }
        }
    }

    // dropping the feed closes the channel, which lets the ingest loop drain and exit
    feed.abort();
    let _ = stop_tx.send(());

    match ingest.await {
        Ok(batches) => info!(batches, counters = ?engine.counters(), "ingest drained"),
        Err(e) => error!(error = ?e, "ingest task panicked"),
    }
    if !api_done {
        let _ = api.await;
    }

    Ok(())
}

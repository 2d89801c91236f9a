//! Tasks that move events from the feed into the engine.

use std::sync::Arc;
use std::time::Duration;

use adapters::alpaca::MarketDataProvider;
use common::logger::{TraceId, batch_span, root_span, warn_if_slow};
use engine::{AnomalyEngine, MarketEvent};
use tokio::sync::mpsc::{Receiver, Sender};
use tracing::{Instrument, info};

/// Batches slower than this are reported on the `performance` target.
const SLOW_BATCH: Duration = Duration::from_millis(50);

/// Drain `rx` into the engine, one `ingest` call per batch.
///
/// Returns the number of batches processed once every sender is gone.
pub async fn run_ingest_loop(
    engine: Arc<AnomalyEngine>,
    mut rx: Receiver<Vec<MarketEvent>>,
) -> u64 {
    let mut batches = 0u64;

    while let Some(batch) = rx.recv().await {
        let trace_id = TraceId::new();
        let span = batch_span(&trace_id, batch.len());

        span.in_scope(|| {
            let anomalies = warn_if_slow("ingest", SLOW_BATCH, || engine.ingest(&batch));
            span.record("anomalies", anomalies.len());
        });
        batches += 1;
    }

    info!(batches, "event channel closed, ingest loop stopping");
    batches
}

/// Run a provider until it stops, inside its own root span.
pub async fn run_feed(
    provider: Arc<dyn MarketDataProvider>,
    sender: Sender<Vec<MarketEvent>>,
) -> anyhow::Result<()> {
    let trace_id = TraceId::new();

    async move {
        info!("market data feed starting");
        let result = provider.stream_events(sender).await;
        match &result {
            Ok(()) => info!("market data feed stopped"),
            Err(e) => tracing::error!(error = %e, "market data feed failed"),
        }
        result
    }
    .instrument(root_span("feed", &trace_id))
    .await
}

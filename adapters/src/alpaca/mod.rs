pub mod parser;
pub mod provider;
pub mod types;
pub mod ws;

use async_trait::async_trait;
use engine::MarketEvent;
use tokio::sync::mpsc::Sender;

/// A live source of decoded market events.
///
/// Every inbound frame becomes one batch on `sender`. Implementations return
/// `Ok(())` once the receiving side is gone and `Err` on unrecoverable failures.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn stream_events(&self, sender: Sender<Vec<MarketEvent>>) -> anyhow::Result<()>;
}

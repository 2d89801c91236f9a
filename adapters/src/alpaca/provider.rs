use async_trait::async_trait;
use engine::MarketEvent;
use tokio::sync::mpsc::Sender;

use super::{
    MarketDataProvider,
    ws::{AlpacaConfig, AlpacaWsClient},
};

pub struct AlpacaProvider {
    client: AlpacaWsClient,
}

impl AlpacaProvider {
    pub fn new(config: AlpacaConfig) -> Self {
        Self {
            client: AlpacaWsClient::new(config),
        }
    }
}

#[async_trait]
impl MarketDataProvider for AlpacaProvider {
    async fn stream_events(&self, sender: Sender<Vec<MarketEvent>>) -> anyhow::Result<()> {
        self.client.run_ws_loop(sender).await
    }
}

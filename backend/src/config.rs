use std::net::SocketAddr;
use std::time::Duration;

use adapters::alpaca::{
    types::Subscription,
    ws::{AlpacaConfig, DEFAULT_STREAM_URL},
};
use clap::Parser;
use engine::EngineConfig;

use crate::error::AppError;

#[derive(Clone, Debug, Parser)]
#[clap(name = "anomaly-watch", version, about = "Streams market data and flags statistical anomalies")]
pub struct AppConfig {
    // =========================
    // Feed
    // =========================
    /// API key id for the market data stream.
    #[clap(long, env = "APCA_API_KEY_ID", hide_env_values = true)]
    pub api_key_id: String,

    /// API secret for the market data stream.
    #[clap(long, env = "APCA_API_SECRET_KEY", hide_env_values = true)]
    pub api_secret_key: String,

    #[clap(long, env = "ANOMALY_STREAM_URL", default_value = DEFAULT_STREAM_URL)]
    pub stream_url: String,

    /// Symbols subscribed on every channel (comma-separated).
    #[clap(
        long,
        env = "ANOMALY_SYMBOLS",
        value_delimiter = ',',
        default_value = "AAPL"
    )]
    pub symbols: Vec<String>,

    /// Wait before reconnecting a dropped stream.
    #[clap(long, env = "ANOMALY_RECONNECT_DELAY_MS", default_value_t = 3_000)]
    pub reconnect_delay_ms: u64,

    /// Batches buffered between the feed and the engine.
    ///
    /// When full, the feed waits for the engine to catch up.
    #[clap(long, env = "ANOMALY_CHANNEL_CAPACITY", default_value_t = 1_024)]
    pub channel_capacity: usize,

    // =========================
    // HTTP
    // =========================
    #[clap(long, env = "ANOMALY_HTTP_ADDR", default_value = "0.0.0.0:8080")]
    pub http_addr: SocketAddr,

    // =========================
    // Engine
    // =========================
    /// Samples kept per metric per symbol.
    #[clap(long, env = "ANOMALY_WINDOW_SIZE", default_value_t = 200)]
    pub window_size: usize,

    /// Recent anomalies retained for queries.
    #[clap(long, env = "ANOMALY_HISTORY_SIZE", default_value_t = 500)]
    pub history_size: usize,

    /// Samples required before a detector may fire.
    #[clap(long, env = "ANOMALY_MIN_POINTS", default_value_t = 20)]
    pub min_points: usize,

    #[clap(long, env = "ANOMALY_EPS", default_value_t = 1e-9)]
    pub eps: f64,

    #[clap(long, env = "ANOMALY_PRICE_K", default_value_t = 2.0)]
    pub price_k: f64,

    #[clap(long, env = "ANOMALY_SPREAD_K", default_value_t = 2.0)]
    pub spread_k: f64,

    #[clap(long, env = "ANOMALY_VOLUME_K", default_value_t = 2.0)]
    pub volume_k: f64,

    /// `production` switches logs to JSON.
    #[clap(long, env = "APP_ENV", default_value = "development")]
    pub app_env: String,
}

impl AppConfig {
    pub fn json_logs(&self) -> bool {
        self.app_env == "production"
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.channel_capacity == 0 {
            return Err(AppError::InvalidSetting {
                field: "channel_capacity",
                reason: "must be at least 1".into(),
            });
        }
        if self.symbols.iter().all(|s| s.trim().is_empty()) {
            return Err(AppError::InvalidSetting {
                field: "symbols",
                reason: "at least one symbol is required".into(),
            });
        }
        self.engine_config().validate()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            window_size: self.window_size,
            history_size: self.history_size,
            min_points: self.min_points,
            eps: self.eps,
            price_k: self.price_k,
            spread_k: self.spread_k,
            volume_k: self.volume_k,
        }
    }

    pub fn alpaca_config(&self) -> AlpacaConfig {
        let symbols: Vec<String> = self
            .symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        AlpacaConfig {
            url: self.stream_url.clone(),
            key: self.api_key_id.clone(),
            secret: self.api_secret_key.clone(),
            subscription: Subscription::all(&symbols),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
        }
    }
}

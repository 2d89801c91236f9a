pub mod anomaly;
pub mod config;
pub mod counters;
pub mod detector;
pub mod manager;
pub mod rolling_window;
pub mod sink;
pub mod state;
pub mod types;

pub mod error;

pub use anomaly::{Anomaly, AnomalyHistory, AnomalyKind, Direction, Source};
pub use config::EngineConfig;
pub use counters::CountersSnapshot;
pub use error::ConfigError;
pub use manager::AnomalyEngine;
pub use sink::{AnomalySink, ChannelSink, LogSink};
pub use state::{SymbolStats, WindowStats};
pub use types::{Bar, BarKind, EventPayload, MarketEvent, Quote, Trade};

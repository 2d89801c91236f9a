//! The anomaly engine: owns the symbol store, the detectors and the history.
//!
//! One coarse lock guards the store and the history. A batch is applied,
//! detected, recorded and handed to sinks while the lock is held, so every
//! detector reads the state its own batch produced and batches never
//! interleave. Queries lock only long enough to copy a snapshot.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::anomaly::{Anomaly, AnomalyHistory};
use crate::config::EngineConfig;
use crate::counters::{Counters, CountersSnapshot};
use crate::detector::{Detector, PriceDetector, SpreadDetector, VolumeDetector};
use crate::error::ConfigError;
use crate::sink::AnomalySink;
use crate::state::{SymbolStateStore, SymbolStats};
use crate::types::MarketEvent;

struct EngineState {
    store: SymbolStateStore,
    history: AnomalyHistory,
}

pub struct AnomalyEngine {
    state: Mutex<EngineState>,
    /// Run in this order for every touched symbol, each with its own k.
    detectors: Vec<(Box<dyn Detector>, f64)>,
    sinks: Vec<Arc<dyn AnomalySink>>,
    counters: Counters,
    config: EngineConfig,
}

impl AnomalyEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let thresholds = config.thresholds();
        let detectors: Vec<(Box<dyn Detector>, f64)> = vec![
            (Box::new(PriceDetector::new(thresholds)), config.price_k),
            (Box::new(SpreadDetector::new(thresholds)), config.spread_k),
            (Box::new(VolumeDetector::new(thresholds)), config.volume_k),
        ];

        Ok(Self {
            state: Mutex::new(EngineState {
                store: SymbolStateStore::new(config.window_size),
                history: AnomalyHistory::new(config.history_size),
            }),
            detectors,
            sinks: Vec::new(),
            counters: Counters::default(),
            config,
        })
    }

    /// Builder-style sink registration.
    pub fn with_sink(mut self, sink: Arc<dyn AnomalySink>) -> Self {
        self.register_sink(sink);
        self
    }

    pub fn register_sink(&mut self, sink: Arc<dyn AnomalySink>) {
        self.sinks.push(sink);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fold a batch into the store and run every detector on each touched symbol.
    ///
    /// Returns the anomalies raised by this batch, in detection order.
    /// Sinks see each anomaly after it was recorded in the history. A panicking
    /// sink is counted and skipped; the remaining sinks still run.
    pub fn ingest(&self, events: &[MarketEvent]) -> Vec<Anomaly> {
        let mut guard = self.state.lock();
        let EngineState { store, history } = &mut *guard;

        let touched = store.apply(events);

        let mut raised = Vec::new();
        for symbol in &touched {
            for (detector, k) in &self.detectors {
                let Some(anomaly) = detector.detect(symbol, store, *k) else {
                    continue;
                };

                history.push(anomaly.clone());
                self.dispatch(&anomaly);
                raised.push(anomaly);
            }
        }
        drop(guard);

        Counters::add(&self.counters.batches, 1);
        Counters::add(&self.counters.events, events.len() as u64);
        Counters::add(&self.counters.anomalies, raised.len() as u64);

        debug!(
            events = events.len(),
            symbols = touched.len(),
            anomalies = raised.len(),
            "batch ingested"
        );

        raised
    }

    fn dispatch(&self, anomaly: &Anomaly) {
        for sink in &self.sinks {
            let result = catch_unwind(AssertUnwindSafe(|| sink.on_anomaly(anomaly)));

            if result.is_err() {
                Counters::add(&self.counters.sink_panics, 1);
                error!(
                    symbol = %anomaly.symbol,
                    kind = ?anomaly.kind,
                    "anomaly sink panicked"
                );
            }
        }
    }

    /// Tracked symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.state.lock().store.symbols()
    }

    /// The most recent anomalies, newest last. `None` returns the whole history.
    pub fn recent_anomalies(&self, limit: Option<usize>) -> Vec<Anomaly> {
        let state = self.state.lock();
        let limit = limit.unwrap_or(state.history.len());
        state.history.recent(limit)
    }

    pub fn symbol_stats(&self, symbol: &str) -> Option<SymbolStats> {
        self.state.lock().store.get(symbol).map(|s| s.stats())
    }

    pub fn counters(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }
}

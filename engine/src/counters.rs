use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Minimal counters for operational visibility.
///
/// Cloning shares the underlying atomics, so readers never need the engine lock.
#[derive(Clone, Default)]
pub struct Counters {
    pub batches: Arc<AtomicU64>,
    pub events: Arc<AtomicU64>,
    pub anomalies: Arc<AtomicU64>,

    // sink failures
    pub sink_panics: Arc<AtomicU64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub batches: u64,
    pub events: u64,
    pub anomalies: u64,
    pub sink_panics: u64,
}

impl Counters {
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            batches: self.batches.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            sink_panics: self.sink_panics.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }
}

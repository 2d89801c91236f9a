use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_HISTORY_SIZE: usize = 500;

/// Which metric deviated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Price,
    Spread,
    Volume,
}

/// Which event kind carried the deviating observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Trade,
    Quote,
    Bar,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Up => "Upward",
            Direction::Down => "Downward",
        }
    }
}

/// A flagged observation together with the baseline it was compared against.
///
/// `note` is for operators only. Consumers must read the structured fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub source: Source,
    pub direction: Direction,
    pub symbol: String,
    /// Timestamp of the triggering observation.
    pub timestamp: DateTime<Utc>,

    pub value: f64,
    pub mean: f64,
    pub stdev: f64,
    /// Signed distance from the mean in standard deviations.
    pub zscore: f64,

    /// `mean - k * stdev`
    pub lower: f64,
    /// `mean + k * stdev`
    pub upper: f64,
    pub k: f64,

    pub note: String,
}

/// Bounded FIFO of the most recent anomalies, oldest first.
#[derive(Clone, Debug)]
pub struct AnomalyHistory {
    items: VecDeque<Anomaly>,
    capacity: usize,
}

impl Default for AnomalyHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl AnomalyHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, anomaly: Anomaly) {
        self.items.push_back(anomaly);

        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Copy of the `limit` most recent anomalies, newest last.
    pub fn recent(&self, limit: usize) -> Vec<Anomaly> {
        let skip = self.items.len().saturating_sub(limit);
        self.items.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.items.iter()
    }
}

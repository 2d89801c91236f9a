//! Rolling z-score detectors.
//!
//! Every detector follows the same recipe:
//!
//! ```text
//! x      = newest observation of the metric (e.g. last trade price)
//! mu     = mean(window)
//! sigma  = population_stdev(window)
//! upper  = mu + k * sigma
//! lower  = mu - k * sigma
//!
//! x > upper  → Up anomaly
//! x < lower  → Down anomaly
//! otherwise  → nothing
//! ```
//!
//! Both comparisons are strict: a value sitting exactly on a band edge is normal.
//!
//! ## Guards
//! A detector returns `None` (never an error) when:
//! - the symbol is empty or unknown
//! - the observation it needs has not been seen yet, or fails its validity check
//! - the window holds fewer than `min_points` samples (cold start)
//! - the window stdev is `<= eps` (flat baseline, z-score undefined)
//!
//! ## Metrics
//! What differs between detectors is captured by [`Metric`]: which window is the
//! baseline, how the new value is read from the state, which timestamp the
//! anomaly carries and how the operator note reads. [`ZScoreDetector`] is the
//! single implementation of the algorithm, instantiated once per metric.
//!
//! The window is read after the batch was folded in, so the new value is part
//! of its own baseline.

pub mod price;
pub mod spread;
pub mod volume;

use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use crate::anomaly::{Anomaly, AnomalyKind, Direction, Source};
use crate::rolling_window::RollingWindow;
use crate::state::{SymbolState, SymbolStateStore};

pub use price::PriceMetric;
pub use spread::SpreadMetric;
pub use volume::VolumeMetric;

/// Minimum samples before a window counts as a baseline.
pub const MIN_POINTS: usize = 20;
/// Stdev floor below which the baseline is treated as flat.
pub const EPS: f64 = 1e-9;
/// Sigma multiplier used when nothing else is configured.
pub const DEFAULT_K: f64 = 2.0;

/// Cold-start and degeneracy guards shared by all detectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub min_points: usize,
    pub eps: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_points: MIN_POINTS,
            eps: EPS,
        }
    }
}

/// The value a detector tests, with the time it was observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub ts: DateTime<Utc>,
}

/// Result of comparing a value against a window baseline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Deviation {
    pub direction: Direction,
    pub value: f64,
    pub mean: f64,
    pub stdev: f64,
    pub zscore: f64,
    pub lower: f64,
    pub upper: f64,
    pub k: f64,
}

impl Deviation {
    /// Absolute distance from the mean.
    pub fn magnitude(&self) -> f64 {
        (self.value - self.mean).abs()
    }

    /// The band edge that was crossed.
    pub fn threshold(&self) -> f64 {
        match self.direction {
            Direction::Up => self.upper,
            Direction::Down => self.lower,
        }
    }

    /// "above" / "below", for notes.
    pub fn side(&self) -> &'static str {
        match self.direction {
            Direction::Up => "above",
            Direction::Down => "below",
        }
    }

    /// ">" / "<", for notes.
    pub fn comparator(&self) -> &'static str {
        match self.direction {
            Direction::Up => ">",
            Direction::Down => "<",
        }
    }
}

/// Compare `value` against the k-sigma band of `window`.
///
/// Pure: applies the cold-start and flat-baseline guards, then the strict band test.
pub fn deviation(
    window: &RollingWindow,
    value: f64,
    k: f64,
    thresholds: Thresholds,
) -> Option<Deviation> {
    if window.len() < thresholds.min_points {
        return None;
    }

    let mean = window.mean();
    let stdev = window.population_stdev();
    if stdev <= thresholds.eps {
        return None;
    }

    let upper = mean + k * stdev;
    let lower = mean - k * stdev;

    let direction = if value > upper {
        Direction::Up
    } else if value < lower {
        Direction::Down
    } else {
        return None;
    };

    Some(Deviation {
        direction,
        value,
        mean,
        stdev,
        zscore: (value - mean) / stdev,
        lower,
        upper,
        k,
    })
}

/// One monitored metric: baseline window, observation and wording.
pub trait Metric: Send + Sync + 'static {
    const KIND: AnomalyKind;
    const SOURCE: Source;

    /// The baseline window for this metric.
    fn window(state: &SymbolState) -> &RollingWindow;

    /// The newest value to test, or `None` when absent or invalid.
    fn observe(state: &SymbolState) -> Option<Observation>;

    /// Operator-facing description of a deviation.
    fn note(symbol: &str, dev: &Deviation) -> String;
}

/// Object-safe detector interface used by the engine.
pub trait Detector: Send + Sync {
    fn kind(&self) -> AnomalyKind;

    /// Evaluate `symbol` against the store with sigma multiplier `k`.
    fn detect(&self, symbol: &str, store: &SymbolStateStore, k: f64) -> Option<Anomaly>;
}

/// The rolling z-score algorithm, specialised by a [`Metric`].
pub struct ZScoreDetector<M> {
    thresholds: Thresholds,
    _metric: PhantomData<fn() -> M>,
}

impl<M: Metric> ZScoreDetector<M> {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            _metric: PhantomData,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }
}

impl<M: Metric> Default for ZScoreDetector<M> {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}

impl<M: Metric> Detector for ZScoreDetector<M> {
    fn kind(&self) -> AnomalyKind {
        M::KIND
    }

    fn detect(&self, symbol: &str, store: &SymbolStateStore, k: f64) -> Option<Anomaly> {
        if symbol.is_empty() {
            return None;
        }

        let state = store.get(symbol)?;
        let obs = M::observe(state)?;
        let dev = deviation(M::window(state), obs.value, k, self.thresholds)?;

        Some(Anomaly {
            kind: M::KIND,
            source: M::SOURCE,
            direction: dev.direction,
            symbol: symbol.to_string(),
            timestamp: obs.ts,
            value: dev.value,
            mean: dev.mean,
            stdev: dev.stdev,
            zscore: dev.zscore,
            lower: dev.lower,
            upper: dev.upper,
            k: dev.k,
            note: M::note(symbol, &dev),
        })
    }
}

pub type PriceDetector = ZScoreDetector<PriceMetric>;
pub type SpreadDetector = ZScoreDetector<SpreadMetric>;
pub type VolumeDetector = ZScoreDetector<VolumeMetric>;


#[cfg(test)]
mod tests {
    use super::testkit::*;
    use super::*;

    const K: f64 = 2.0;

    #[test]
    fn band_edges_are_not_anomalous() {
        let w = alternating(100.0, 5.0, 20);
        assert_eq!(w.mean(), 100.0);
        assert_eq!(w.population_stdev(), 5.0);

        assert!(deviation(&w, 110.0, K, Thresholds::default()).is_none());
        assert!(deviation(&w, 90.0, K, Thresholds::default()).is_none());
    }

    #[test]
    fn just_outside_the_band_fires() {
        let w = alternating(100.0, 5.0, 20);

        let up = deviation(&w, 110.0001, K, Thresholds::default()).unwrap();
        assert_eq!(up.direction, Direction::Up);
        assert!(up.zscore > 2.0);

        let down = deviation(&w, 89.9999, K, Thresholds::default()).unwrap();
        assert_eq!(down.direction, Direction::Down);
        assert!(down.zscore < -2.0);
    }

    #[test]
    fn reports_both_band_edges_whatever_the_direction() {
        let w = alternating(100.0, 5.0, 20);

        let down = deviation(&w, 50.0, K, Thresholds::default()).unwrap();
        assert_eq!(down.lower, 90.0);
        assert_eq!(down.upper, 110.0);
        assert_eq!(down.zscore, -10.0);
        assert_eq!(down.threshold(), 90.0);
        assert_eq!(down.magnitude(), 50.0);
        assert_eq!(down.k, K);
    }

    #[test]
    fn cold_start_suppresses_detection() {
        let w = alternating(100.0, 5.0, 19);

        assert!(deviation(&w, 1_000_000.0, K, Thresholds::default()).is_none());
        assert!(deviation(&w, -1_000_000.0, K, Thresholds::default()).is_none());
    }

    #[test]
    fn flat_baseline_suppresses_detection() {
        let mut w = RollingWindow::new(200);
        for _ in 0..50 {
            w.push(100.0);
        }

        assert!(deviation(&w, 150.0, K, Thresholds::default()).is_none());
        assert!(deviation(&w, 0.0, K, Thresholds::default()).is_none());
    }

    #[test]
    fn thresholds_are_configurable() {
        let w = alternating(100.0, 5.0, 6);
        let relaxed = Thresholds {
            min_points: 5,
            eps: 1e-9,
        };
        assert!(deviation(&w, 200.0, K, relaxed).is_some());

        let strict_eps = Thresholds {
            min_points: 5,
            eps: 10.0,
        };
        assert!(deviation(&w, 200.0, K, strict_eps).is_none());
    }

    #[test]
    fn larger_k_widens_the_band() {
        let w = alternating(100.0, 5.0, 20);

        assert!(deviation(&w, 112.0, 2.0, Thresholds::default()).is_some());
        assert!(deviation(&w, 112.0, 3.0, Thresholds::default()).is_none());
    }
}

//! Volume detector: last bar volume against the bar-volume window.
//!
//! Anomalies carry the last bar timestamp in both directions.

use super::{Deviation, Metric, Observation};
use crate::anomaly::{AnomalyKind, Direction, Source};
use crate::rolling_window::RollingWindow;
use crate::state::SymbolState;

pub struct VolumeMetric;

impl Metric for VolumeMetric {
    const KIND: AnomalyKind = AnomalyKind::Volume;
    const SOURCE: Source = Source::Bar;

    fn window(state: &SymbolState) -> &RollingWindow {
        &state.bar_volumes
    }

    fn observe(state: &SymbolState) -> Option<Observation> {
        let bar = state.last_bar.as_ref()?;
        Some(Observation {
            value: bar.volume,
            ts: state.last_bar_ts?,
        })
    }

    fn note(symbol: &str, dev: &Deviation) -> String {
        let context = match dev.direction {
            Direction::Up => {
                "Unusually heavy activity, often seen around news, the open or close, or large institutional orders."
            }
            Direction::Down => {
                "Unusually quiet activity, often seen off-hours or when liquidity dries up."
            }
        };

        format!(
            "{} volume anomaly: {} had bar volume {:.0}, {} the recent average {:.2} by {:.2} ({:.2} standard deviations, threshold {} {:.2}). {}",
            dev.direction.label(),
            symbol,
            dev.value,
            dev.side(),
            dev.mean,
            dev.magnitude(),
            dev.zscore.abs(),
            dev.comparator(),
            dev.threshold(),
            context,
        )
    }
}

//! Price detector: last trade price against the shared price window.

use super::{Deviation, Metric, Observation};
use crate::anomaly::{AnomalyKind, Direction, Source};
use crate::rolling_window::RollingWindow;
use crate::state::SymbolState;

pub struct PriceMetric;

impl Metric for PriceMetric {
    const KIND: AnomalyKind = AnomalyKind::Price;
    const SOURCE: Source = Source::Trade;

    fn window(state: &SymbolState) -> &RollingWindow {
        &state.prices
    }

    fn observe(state: &SymbolState) -> Option<Observation> {
        let trade = state.last_trade.as_ref()?;
        Some(Observation {
            value: trade.price,
            ts: state.last_trade_ts?,
        })
    }

    fn note(symbol: &str, dev: &Deviation) -> String {
        let context = match dev.direction {
            Direction::Up => {
                "Unusually strong move against recent behaviour, typical of fresh news or a burst of buying pressure."
            }
            Direction::Down => {
                "Unusually sharp drop against recent behaviour, typical of negative news or a burst of selling pressure."
            }
        };

        format!(
            "{} price anomaly: {} traded at {:.4}, {} the recent average {:.4} by {:.4} ({:.2} standard deviations, threshold {} {:.4}). {}",
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

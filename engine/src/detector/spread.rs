//! Spread detector: last quote's bid-ask spread against the spread window.
//!
//! A quote only yields an observation when both sides are positive and the
//! book is not crossed, the same rule the updater uses to feed the window.

use super::{Deviation, Metric, Observation};
use crate::anomaly::{AnomalyKind, Direction, Source};
use crate::rolling_window::RollingWindow;
use crate::state::SymbolState;

pub struct SpreadMetric;

impl Metric for SpreadMetric {
    const KIND: AnomalyKind = AnomalyKind::Spread;
    const SOURCE: Source = Source::Quote;

    fn window(state: &SymbolState) -> &RollingWindow {
        &state.spreads
    }

    fn observe(state: &SymbolState) -> Option<Observation> {
        let spread = state.last_quote.as_ref()?.spread()?;
        Some(Observation {
            value: spread,
            ts: state.last_quote_ts?,
        })
    }

    fn note(symbol: &str, dev: &Deviation) -> String {
        let context = match dev.direction {
            Direction::Up => {
                "Liquidity is thinner than usual and prices may be less stable."
            }
            Direction::Down => {
                "The book is unusually tight, which happens when many buyers and sellers are active at once."
            }
        };

        format!(
            "{} spread anomaly: {} has a bid-ask spread of {:.4}, {} the recent average {:.4} by {:.4} ({:.2} standard deviations, threshold {} {:.4}). {}",
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

use tracing::{Span, field};

use super::TraceId;

/// Create a root span for a long-lived task (feed, ingest loop, api server).
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
    )
}

/// Span wrapping the ingestion of one event batch.
///
/// `anomalies` starts empty and is recorded once detection has run.
pub fn batch_span(trace_id: &TraceId, events: usize) -> Span {
    tracing::debug_span!(
        "batch",
        trace_id = %trace_id,
        events,
        anomalies = field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_can_be_created_without_subscriber() {
        let id = TraceId::default();
        let root = root_span("ingest", &id);
        let _guard = root.enter();
        let batch = batch_span(&id, 3);
        batch.record("anomalies", 1);
    }
}

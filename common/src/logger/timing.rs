use std::time::{Duration, Instant};

/// Run `f` and emit a `performance` warning when it takes longer than `max`.
pub fn warn_if_slow<T>(label: &'static str, max: Duration, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

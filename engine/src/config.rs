use crate::anomaly::DEFAULT_HISTORY_SIZE;
use crate::detector::{DEFAULT_K, EPS, MIN_POINTS, Thresholds};
use crate::error::ConfigError;
use crate::rolling_window::DEFAULT_WINDOW_SIZE;

/// Tuning knobs of the anomaly engine.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Samples kept per metric per symbol.
    ///
    /// Larger windows give a smoother baseline that adapts more slowly.
    pub window_size: usize,

    /// Number of recent anomalies retained for queries.
    pub history_size: usize,

    /// Samples a window needs before its detector may fire (cold start).
    pub min_points: usize,

    /// Stdev floor; flatter baselines never fire.
    pub eps: f64,

    // =========================
    // Sensitivity (sigma multipliers)
    // =========================
    // Lower k = more sensitive = more false positives.
    pub price_k: f64,
    pub spread_k: f64,
    pub volume_k: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            history_size: DEFAULT_HISTORY_SIZE,
            min_points: MIN_POINTS,
            eps: EPS,
            price_k: DEFAULT_K,
            spread_k: DEFAULT_K,
            volume_k: DEFAULT_K,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        at_least("window_size", self.window_size, 1)?;
        at_least("history_size", self.history_size, 1)?;
        at_least("min_points", self.min_points, 1)?;

        if self.min_points > self.window_size {
            return Err(ConfigError::MinPointsExceedsWindow {
                min_points: self.min_points,
                window_size: self.window_size,
            });
        }

        if !self.eps.is_finite() || self.eps < 0.0 {
            return Err(ConfigError::InvalidFloat {
                field: "eps",
                rule: ">= 0",
                value: self.eps,
            });
        }

        for (field, k) in [
            ("price_k", self.price_k),
            ("spread_k", self.spread_k),
            ("volume_k", self.volume_k),
        ] {
            if !k.is_finite() || k <= 0.0 {
                return Err(ConfigError::InvalidFloat {
                    field,
                    rule: "> 0",
                    value: k,
                });
            }
        }

        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_points: self.min_points,
            eps: self.eps,
        }
    }
}

fn at_least(field: &'static str, value: usize, min: usize) -> Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::TooSmall { field, min, value });
    }
    Ok(())
}

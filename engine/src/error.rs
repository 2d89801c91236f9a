use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at least {min}, got {value}")]
    TooSmall {
        field: &'static str,
        min: usize,
        value: usize,
    },

    #[error("min_points ({min_points}) cannot exceed window_size ({window_size})")]
    MinPointsExceedsWindow {
        min_points: usize,
        window_size: usize,
    },

    #[error("{field} must be a finite number {rule}, got {value}")]
    InvalidFloat {
        field: &'static str,
        rule: &'static str,
        value: f64,
    },
}

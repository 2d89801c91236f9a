use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use engine::ConfigError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownSymbol(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::InvalidSetting { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::UnknownSymbol(_) => "not_found",
            AppError::Config(_) | AppError::InvalidSetting { .. } => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    /// The feed answered a handshake step with an error message.
    /// Retrying with the same credentials cannot succeed.
    #[error("feed rejected {stage}: {msg} (code {code:?})")]
    Rejected {
        stage: &'static str,
        code: Option<i64>,
        msg: String,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

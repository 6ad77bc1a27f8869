use thiserror::Error;

/// Unified error type for Taplog.
#[derive(Error, Debug)]
pub enum TaplogError {
    /// The operation is deliberately not supported by this component.
    /// Callers must obtain history from a downstream store, never from
    /// the capture pipeline itself.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

impl TaplogError {
    /// The canonical error for the absent read-back API.
    pub fn read_back_unsupported() -> Self {
        TaplogError::Unsupported(
            "log history is not readable from the capture pipeline; \
             attach a consumer and query its downstream store"
                .to_string(),
        )
    }
}

use thiserror::Error;

/// Top-level error type for Pulse.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Input rejected before persistence: bad score range, malformed reply,
    /// missing required field. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Duplicate daily response or duplicate unique key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Outbound SMS delivery failure. Logged and counted, not retried.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Database/storage error.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Error types for the sol directive pipeline.
//!
//! Reply parsing and blink normalization never fail; a bad reply is a
//! [`Directive::Malformed`](crate::directive::Directive::Malformed) value.
//! These errors cover the surrounding plumbing: config, I/O and dispatch.

/// Top-level error type for the directive pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SolError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stdio bridge read/write error.
    #[error("channel error: {0}")]
    Channel(String),

    /// Publishing a device payload failed.
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// JSON encoding error.
    #[error("serialize error: {0}")]
    Serialize(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SolError>;

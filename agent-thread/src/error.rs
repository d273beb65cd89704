//! Error types for the gateway boundary and the conversation loop.

use thiserror::Error;

/// Failure talking to the remote agent service.
///
/// None of these are retried; they propagate out of the conversation loop.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The gateway does not know the requested thread/run/agent (mock and tests).
    #[error("not found: {0}")]
    NotFound(String),
}

/// Error that ends a conversation session.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Thread creation returned no usable handle.
    #[error("failed to create a thread")]
    ThreadCreation,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("terminal I/O: {0}")]
    Io(#[from] std::io::Error),
}

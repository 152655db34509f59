//! Error types for the codec and transport layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Inbound payload is not valid JSON, lacks `status`, or has an unknown/ill-typed body.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("could not encode handshake: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid gateway url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("tls setup failed: {0}")]
    Tls(String),
    #[error("transport is closed")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

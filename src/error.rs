//! Crate-level error types.
//!
//! [`DepthlineError`] unifies the fallible edges of the crate (configuration,
//! WebSocket transport, JSON framing) behind a single enum. The aggregation
//! engine itself never returns errors.

use rust_decimal::Decimal;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DepthlineError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum DepthlineError {
    /// A configuration value or markets file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An inbound frame did not match the feed's envelope.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Bucket sizes must be at least `BucketSize::MIN`.
    #[error("invalid bucket size: {0}")]
    InvalidBucketSize(Decimal),

    /// The connection attempt did not complete in time.
    #[error("connect timed out")]
    ConnectTimeout,
}

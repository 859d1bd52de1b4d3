//! Error types for the bot hub

use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bot hub
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure talking to the bot API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bot API answered, but not with something usable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Message encoding errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection's writer has gone away
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// The connection's outbound queue is full; the client is not keeping up
    #[error("Outbound queue full: {0}")]
    QueueFull(String),
}

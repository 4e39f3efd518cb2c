//! Error types for the networking module.

/// Network-specific errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Invalid endpoint URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Connection refused or failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// The WebSocket handshake did not complete in time.
    #[error("WebSocket handshake timed out")]
    Timeout,
    /// WebSocket protocol or I/O error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),
    /// A send was attempted while the session was not open.
    #[error("WebSocket is not open")]
    NotOpen,
    /// No async runtime is available to drive the transport.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<url::ParseError> for NetworkError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for NetworkError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error;
        match err {
            Error::Url(e) => Self::InvalidUrl(e.to_string()),
            Error::Io(e) => Self::Connection(e.to_string()),
            other => Self::WebSocket(other.to_string()),
        }
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;

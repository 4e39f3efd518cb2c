//! Error types for Bithose Console core systems.

/// The main error type for core operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The event queue has shut down and no longer accepts invocations.
    #[error("Event queue has shut down")]
    QueueClosed,
    /// Installing the global tracing subscriber failed.
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

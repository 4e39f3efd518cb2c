//! Error types for the console.

use std::path::PathBuf;

use bithose_console_core::CoreError;
use bithose_console_net::NetworkError;

/// The composer buffer is not syntactically valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid JSON: {message}")]
pub struct ValidationError {
    /// 1-based line of the parse failure.
    pub line: usize,
    /// 1-based column of the parse failure (0 when the input ended early).
    pub column: usize,
    /// The parser's description, including the position.
    pub message: String,
}

impl From<serde_json::Error> for ValidationError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Why a pane's send did not transmit.
///
/// The pane has already logged a notice for every variant; callers only need
/// this to react programmatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The buffer failed JSON validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The session is not open.
    #[error("websocket is not open")]
    NotOpen,
    /// The transport refused the frame.
    #[error(transparent)]
    Transport(NetworkError),
}

/// Errors building typed wire frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A criterion used an operator the broker does not understand.
    #[error("unknown operator for criterion: `{0}`")]
    UnknownOperator(String),
    /// The frame could not be serialized.
    #[error("failed to serialize frame: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range or malformed.
    #[error("invalid config value for `{field}`: {message}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Errors parsing an operator command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The command name is not recognised.
    #[error("unknown command `:{0}` (try :help)")]
    Unknown(String),
    /// The command needs an argument that was not given.
    #[error("`:{0}` needs an argument")]
    MissingArgument(&'static str),
    /// An argument could not be parsed.
    #[error("invalid argument `{argument}` for `:{command}`")]
    InvalidArgument {
        /// The command.
        command: &'static str,
        /// The argument as typed.
        argument: String,
    },
    /// The arguments do not make a valid frame.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// A pane number outside `1..=count`.
    #[error("no pane {index} (panes are 1-{count})")]
    NoSuchPane {
        /// The 1-based pane number asked for.
        index: usize,
        /// How many panes exist.
        count: usize,
    },
}

/// Top-level errors surfaced by the console binary.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Networking setup failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Core setup (logging, event queue) failed.
    #[error(transparent)]
    Core(#[from] CoreError),
    /// Terminal I/O failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for console operations.
pub type Result<T> = std::result::Result<T, ConsoleError>;

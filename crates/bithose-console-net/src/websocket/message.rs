//! Session state and close reasons.

use std::fmt;

/// Current state of a session's connection.
///
/// Transitions only move forward: `Idle → Connecting → Open → Closed`, with
/// `Connecting → Closed` when the handshake fails. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Constructed but not yet opened.
    #[default]
    Idle,
    /// Handshake in progress.
    Connecting,
    /// Connected and ready to send/receive frames.
    Open,
    /// Connection ended. No further events are delivered.
    Closed,
}

impl SessionState {
    /// Whether the session still holds (or is acquiring) a live connection.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Standard WebSocket close codes as defined in RFC 6455.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CloseCode {
    /// Normal closure; the connection successfully completed.
    #[default]
    Normal,
    /// Endpoint is going away (e.g., server shutting down).
    Away,
    /// Protocol error occurred.
    Protocol,
    /// Received data type that cannot be accepted.
    Unsupported,
    /// No status code was provided.
    NoStatus,
    /// Connection was closed abnormally (no close frame received).
    Abnormal,
    /// Received data that was not consistent with the message type.
    Invalid,
    /// Policy violation.
    Policy,
    /// Message too big to process.
    TooBig,
    /// Extension negotiation failed.
    Extension,
    /// Unexpected condition prevented the request from being fulfilled.
    Error,
    /// Server is restarting.
    Restart,
    /// Server is too busy; try again later.
    Again,
    /// Any other code (application-specific codes live in 4000-4999).
    Custom(u16),
}

impl CloseCode {
    /// Convert to the numeric close code.
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Normal => 1000,
            Self::Away => 1001,
            Self::Protocol => 1002,
            Self::Unsupported => 1003,
            Self::NoStatus => 1005,
            Self::Abnormal => 1006,
            Self::Invalid => 1007,
            Self::Policy => 1008,
            Self::TooBig => 1009,
            Self::Extension => 1010,
            Self::Error => 1011,
            Self::Restart => 1012,
            Self::Again => 1013,
            Self::Custom(code) => *code,
        }
    }

    /// Create from a numeric close code.
    pub fn from_u16(code: u16) -> Self {
        match code {
            1000 => Self::Normal,
            1001 => Self::Away,
            1002 => Self::Protocol,
            1003 => Self::Unsupported,
            1005 => Self::NoStatus,
            1006 => Self::Abnormal,
            1007 => Self::Invalid,
            1008 => Self::Policy,
            1009 => Self::TooBig,
            1010 => Self::Extension,
            1011 => Self::Error,
            1012 => Self::Restart,
            1013 => Self::Again,
            code => Self::Custom(code),
        }
    }
}

/// Reason a session was closed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CloseReason {
    /// The close status code.
    pub code: CloseCode,
    /// Optional human-readable reason string.
    pub reason: Option<String>,
}

impl CloseReason {
    /// Create a close reason with just a code.
    pub fn new(code: CloseCode) -> Self {
        Self { code, reason: None }
    }

    /// Create a close reason with a code and message.
    pub fn with_reason(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: Some(reason.into()),
        }
    }

    /// Create a normal close reason.
    pub fn normal() -> Self {
        Self::new(CloseCode::Normal)
    }

    /// Create the reason reported when the connection dropped without a close frame.
    pub fn abnormal() -> Self {
        Self::new(CloseCode::Abnormal)
    }

    /// Whether this is a clean, normal closure.
    pub fn is_normal(&self) -> bool {
        self.code == CloseCode::Normal
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) if !reason.is_empty() => write!(f, "{}: {}", self.code.as_u16(), reason),
            _ => write!(f, "{}", self.code.as_u16()),
        }
    }
}

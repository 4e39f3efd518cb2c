//! A single console pane: one session, one composer, one log.
//!
//! [`SessionWidget`] wires its [`Session`]'s signals into its [`EventLog`]
//! (one entry per event, in delivery order) and gates outbound text on
//! JSON validity. Panes share nothing; each owns its own session and log.

use std::fmt;
use std::sync::Arc;

use bithose_console_core::ConnectionType;
use bithose_console_core::logging::targets;
use bithose_console_net::{
    CloseReason, Connector, NetworkError, Session, SessionConfig, SessionState,
};
use serde::de::IgnoredAny;

use crate::composer::{PayloadComposer, Preset};
use crate::error::{SendError, ValidationError};
use crate::log::{EntryOrigin, EventLog};

/// Logged when the session opens.
pub const OPEN_NOTICE: &str = "websocket open";
/// Logged when the session closes normally.
pub const CLOSE_NOTICE: &str = "websocket closed";
/// Prefix of logged transport errors.
pub const ERROR_NOTICE_PREFIX: &str = "there's been an error: ";
/// Prefix of notices for sends that were not transmitted.
pub const NOT_SENT_PREFIX: &str = "not sent: ";

/// Check that `text` is syntactically valid JSON.
///
/// Only syntax is checked; the value is discarded.
pub fn validate_json(text: &str) -> Result<(), ValidationError> {
    serde_json::from_str::<IgnoredAny>(text)?;
    Ok(())
}

/// Text logged for a close event.
pub fn close_notice(reason: &CloseReason) -> String {
    if reason.is_normal() {
        CLOSE_NOTICE.to_string()
    } else {
        format!("{CLOSE_NOTICE} ({reason})")
    }
}

/// Text logged for a transport error.
pub fn error_notice(error: &NetworkError) -> String {
    format!("{ERROR_NOTICE_PREFIX}{error}")
}

/// One pane of the console.
pub struct SessionWidget {
    index: usize,
    session: Session,
    composer: PayloadComposer,
    log: Arc<EventLog>,
}

impl SessionWidget {
    /// Create a pane and open its session.
    ///
    /// Session events reach the log through slots connected with `delivery`:
    /// `Direct` appends on whichever thread the transport reports from,
    /// `Queued` defers every append to that event queue.
    pub fn mount(
        index: usize,
        config: SessionConfig,
        connector: &dyn Connector,
        delivery: ConnectionType,
    ) -> Self {
        let session = Session::new(config);
        let log = Arc::new(EventLog::new());
        connect_log(&session, &log, delivery);

        tracing::debug!(
            target: targets::WIDGET,
            pane = index,
            session = %session.id(),
            url = session.url(),
            "mounting pane"
        );
        session.open(connector);

        Self {
            index,
            session,
            composer: PayloadComposer::new(),
            log,
        }
    }

    /// Zero-based position of this pane in the console.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The pane's session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// The pane's outbound buffer.
    pub fn composer(&self) -> &PayloadComposer {
        &self.composer
    }

    /// The pane's log.
    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    /// Replace the buffer with a preset. Does not touch the session.
    pub fn load_preset(&self, preset: Preset) {
        tracing::trace!(target: targets::WIDGET, pane = self.index, %preset, "loading preset");
        self.composer.load_preset(preset);
    }

    /// Send the buffer.
    ///
    /// The buffer must parse as JSON and the session must be open; otherwise
    /// nothing is transmitted and exactly one notice is logged. On success
    /// the buffer text is transmitted unchanged.
    pub fn send(&self) -> Result<(), SendError> {
        let text = self.composer.text();

        if let Err(err) = validate_json(&text) {
            tracing::debug!(target: targets::WIDGET, pane = self.index, %err, "rejecting invalid buffer");
            self.log
                .append(EntryOrigin::LocalNotice, format!("{NOT_SENT_PREFIX}{err}"));
            return Err(SendError::Invalid(err));
        }

        match self.session.send_text(text) {
            Ok(()) => {
                tracing::debug!(target: targets::WIDGET, pane = self.index, "frame sent");
                Ok(())
            }
            Err(NetworkError::NotOpen) => {
                tracing::debug!(
                    target: targets::WIDGET,
                    pane = self.index,
                    state = %self.session.state(),
                    "send while not open"
                );
                self.log.append(
                    EntryOrigin::LocalNotice,
                    format!("{NOT_SENT_PREFIX}{}", SendError::NotOpen),
                );
                Err(SendError::NotOpen)
            }
            Err(err) => {
                tracing::warn!(target: targets::WIDGET, pane = self.index, %err, "transport refused frame");
                self.log.append(EntryOrigin::ErrorNotice, error_notice(&err));
                Err(SendError::Transport(err))
            }
        }
    }

    /// Release the session. Returns `false` if it was already released.
    pub fn close(&self) -> bool {
        let released = self.session.close();
        if released {
            tracing::debug!(target: targets::WIDGET, pane = self.index, "pane closed");
        }
        released
    }
}

impl Drop for SessionWidget {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for SessionWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionWidget")
            .field("index", &self.index)
            .field("session", &self.session)
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

/// Route every session event into `log`, one entry per event.
fn connect_log(session: &Session, log: &Arc<EventLog>, delivery: ConnectionType) {
    let signals = session.signals();

    let l = log.clone();
    signals.opened.connect_with_type(
        move |_| {
            l.append(EntryOrigin::LocalNotice, OPEN_NOTICE);
        },
        delivery.clone(),
    );

    let l = log.clone();
    signals.closed.connect_with_type(
        move |reason| {
            l.append(EntryOrigin::LocalNotice, close_notice(reason));
        },
        delivery.clone(),
    );

    let l = log.clone();
    signals.error.connect_with_type(
        move |err| {
            l.append(EntryOrigin::ErrorNotice, error_notice(err));
        },
        delivery.clone(),
    );

    let l = log.clone();
    signals.text_received.connect_with_type(
        move |text| {
            l.append(EntryOrigin::RemoteFrame, text.clone());
        },
        delivery,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bithose_console_net::CloseCode;

    #[test]
    fn test_validate_json() {
        assert!(validate_json("{}").is_ok());
        assert!(validate_json("[1, 2, 3]").is_ok());
        assert!(validate_json("  \"just a string\"  \n").is_ok());

        let err = validate_json("{ not json").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column > 0);

        let err = validate_json("{\n  \"a\": 1,\n}").unwrap_err();
        assert_eq!(err.line, 3);

        assert!(validate_json("").is_err());
        assert!(validate_json("{} {}").is_err());
    }

    #[test]
    fn test_close_notice() {
        assert_eq!(close_notice(&CloseReason::normal()), "websocket closed");
        assert_eq!(
            close_notice(&CloseReason::new(CloseCode::Abnormal)),
            "websocket closed (1006)"
        );
        assert_eq!(
            close_notice(&CloseReason::with_reason(CloseCode::Away, "bye")),
            "websocket closed (1001: bye)"
        );
    }

    #[test]
    fn test_error_notice() {
        assert_eq!(
            error_notice(&NetworkError::Timeout),
            "there's been an error: WebSocket handshake timed out"
        );
    }
}

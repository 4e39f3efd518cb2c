//! One WebSocket connection per session, with gated event delivery.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bithose_console_core::Signal;
use bithose_console_core::logging::targets;
use parking_lot::{Mutex, ReentrantMutex};
use url::Url;

use super::message::{CloseReason, SessionState};
use super::transport::{Connector, Link};
use crate::error::{NetworkError, Result};

/// Default time allowed for the opening handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// The endpoint URL (`ws://host:port/`).
    pub url: String,
    /// How long the opening handshake may take before it is reported as failed.
    pub handshake_timeout: Duration,
}

impl SessionConfig {
    /// Create a new configuration for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Set the handshake timeout.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

/// Normalize an endpoint into a `ws://` URL string.
///
/// Accepts either a full `ws://` URL or a bare `host:port`, which gets the
/// `ws://` scheme and a `/` path. Secure (`wss://`) and non-WebSocket schemes
/// are rejected.
pub fn parse_endpoint(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(NetworkError::InvalidUrl("endpoint is empty".into()));
    }

    let url = if input.contains("://") {
        Url::parse(input)?
    } else {
        Url::parse(&format!("ws://{input}/"))?
    };

    if url.scheme() != "ws" {
        return Err(NetworkError::InvalidUrl(format!(
            "unsupported scheme `{}` (only ws:// is supported)",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(NetworkError::InvalidUrl(format!("missing host in `{input}`")));
    }

    Ok(url.to_string())
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a session, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Signals emitted by a [`Session`].
#[derive(Default)]
pub struct SessionSignals {
    /// The handshake completed and the session is open.
    pub opened: Signal<()>,
    /// The connection ended, locally or remotely.
    pub closed: Signal<CloseReason>,
    /// The transport reported an error.
    pub error: Signal<NetworkError>,
    /// A text frame arrived. Carries the exact received text.
    pub text_received: Signal<String>,
}

impl fmt::Debug for SessionSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSignals")
            .field("opened", &self.opened)
            .field("closed", &self.closed)
            .field("error", &self.error)
            .field("text_received", &self.text_received)
            .finish()
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    errored: bool,
    released: bool,
}

/// State shared between the session and its transport.
///
/// `gate` serializes emission: every event is checked against `inner` and
/// emitted while the gate is held, so once `close` has marked the session
/// released no transport event can slip out afterwards. The gate is
/// reentrant so a slot may query the session while an event is in flight.
struct SessionShared {
    id: SessionId,
    gate: ReentrantMutex<()>,
    inner: Mutex<SessionInner>,
    signals: SessionSignals,
}

/// The transport's handle for reporting events into a session.
///
/// Cheap to clone. Every method is a no-op once the session has been
/// released or when the event does not fit the current state.
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<SessionShared>,
}

impl EventSink {
    /// Report a completed handshake. Only honoured while `Connecting`.
    pub fn opened(&self) {
        let _gate = self.shared.gate.lock();
        {
            let mut inner = self.shared.inner.lock();
            if inner.released || inner.state != SessionState::Connecting {
                tracing::trace!(target: targets::SESSION, session = %self.shared.id, "discarding open event");
                return;
            }
            inner.state = SessionState::Open;
        }
        tracing::debug!(target: targets::SESSION, session = %self.shared.id, "session open");
        self.shared.signals.opened.emit(());
    }

    /// Report a received text frame. Only honoured while `Open`.
    pub fn text_received(&self, text: String) {
        let _gate = self.shared.gate.lock();
        {
            let inner = self.shared.inner.lock();
            if inner.released || inner.state != SessionState::Open {
                tracing::trace!(target: targets::SESSION, session = %self.shared.id, "discarding inbound frame");
                return;
            }
        }
        tracing::trace!(target: targets::SESSION, session = %self.shared.id, len = text.len(), "frame received");
        self.shared.signals.text_received.emit(text);
    }

    /// Report a transport error. Does not close the session by itself.
    pub fn error(&self, error: NetworkError) {
        let _gate = self.shared.gate.lock();
        {
            let mut inner = self.shared.inner.lock();
            if inner.released || !inner.state.is_live() {
                tracing::trace!(target: targets::SESSION, session = %self.shared.id, %error, "discarding error event");
                return;
            }
            inner.errored = true;
        }
        tracing::warn!(target: targets::SESSION, session = %self.shared.id, %error, "transport error");
        self.shared.signals.error.emit(error);
    }

    /// Report that the connection ended. Moves the session to `Closed`.
    pub fn closed(&self, reason: CloseReason) {
        let _gate = self.shared.gate.lock();
        {
            let mut inner = self.shared.inner.lock();
            if inner.released || !inner.state.is_live() {
                tracing::trace!(target: targets::SESSION, session = %self.shared.id, "discarding close event");
                return;
            }
            inner.state = SessionState::Closed;
        }
        tracing::debug!(target: targets::SESSION, session = %self.shared.id, %reason, "session closed by transport");
        self.shared.signals.closed.emit(reason);
    }

    /// Whether the owning session has been released.
    ///
    /// Transports can use this to stop work early; events reported after
    /// release are discarded either way.
    pub fn is_released(&self) -> bool {
        self.shared.inner.lock().released
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").field("session", &self.shared.id).finish()
    }
}

/// A single connection to a fixed endpoint.
///
/// The session moves through `Idle → Connecting → Open → Closed` and never
/// reconnects. It exclusively owns its transport [`Link`], which is released
/// exactly once: by [`close`](Self::close) or, failing that, on drop.
pub struct Session {
    config: SessionConfig,
    shared: Arc<SessionShared>,
    link: Mutex<Option<Box<dyn Link>>>,
}

impl Session {
    /// Create an idle session for the given endpoint.
    pub fn new(config: SessionConfig) -> Self {
        let id = SessionId::next();
        tracing::trace!(target: targets::SESSION, session = %id, url = %config.url, "session created");
        Self {
            config,
            shared: Arc::new(SessionShared {
                id,
                gate: ReentrantMutex::new(()),
                inner: Mutex::new(SessionInner::default()),
                signals: SessionSignals::default(),
            }),
            link: Mutex::new(None),
        }
    }

    /// This session's identifier.
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// The signals this session emits.
    pub fn signals(&self) -> &SessionSignals {
        &self.shared.signals
    }

    /// The endpoint this session connects to.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.shared.inner.lock().state
    }

    /// Whether the session is open and can send frames.
    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Whether a transport error has been reported on this session.
    pub fn has_errored(&self) -> bool {
        self.shared.inner.lock().errored
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_released(&self) -> bool {
        self.shared.inner.lock().released
    }

    /// Start connecting through `connector`.
    ///
    /// Never fails synchronously: the outcome arrives later as `opened`, or
    /// as `error` followed by `closed`. Does nothing unless the session is
    /// `Idle`.
    pub fn open(&self, connector: &dyn Connector) {
        let mut link = self.link.lock();
        {
            let mut inner = self.shared.inner.lock();
            if inner.released || inner.state != SessionState::Idle {
                tracing::debug!(
                    target: targets::SESSION,
                    session = %self.shared.id,
                    state = %inner.state,
                    "open ignored"
                );
                return;
            }
            inner.state = SessionState::Connecting;
        }

        tracing::debug!(target: targets::SESSION, session = %self.shared.id, url = %self.config.url, "connecting");
        let sink = EventSink {
            shared: self.shared.clone(),
        };
        *link = Some(connector.connect(&self.config, sink));
    }

    /// Transmit `text` as one text frame, verbatim.
    ///
    /// Returns [`NetworkError::NotOpen`] without transmitting anything unless
    /// the session is `Open`.
    pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
        if !self.is_open() {
            return Err(NetworkError::NotOpen);
        }
        let text = text.into();
        let link = self.link.lock();
        let link = link.as_ref().ok_or(NetworkError::NotOpen)?;
        tracing::trace!(target: targets::SESSION, session = %self.shared.id, len = text.len(), "sending frame");
        link.send_text(text)
    }

    /// Release the session.
    ///
    /// The first call on a live session emits one `closed` event with a
    /// normal close reason and releases the transport. After this returns no
    /// further event is emitted. Returns `false` if the session was already
    /// released.
    pub fn close(&self) -> bool {
        {
            let _gate = self.shared.gate.lock();
            let was_live = {
                let mut inner = self.shared.inner.lock();
                if inner.released {
                    return false;
                }
                inner.released = true;
                let was_live = inner.state.is_live();
                inner.state = SessionState::Closed;
                was_live
            };
            tracing::debug!(target: targets::SESSION, session = %self.shared.id, was_live, "session released");
            if was_live {
                self.shared.signals.closed.emit(CloseReason::normal());
            }
        }

        // The gate is dropped first: `open` holds the link lock while the
        // connector may report events.
        if let Some(mut link) = self.link.lock().take() {
            link.release();
        }
        true
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("Session")
            .field("id", &self.shared.id)
            .field("url", &self.config.url)
            .field("state", &inner.state)
            .field("errored", &inner.errored)
            .field("released", &inner.released)
            .finish()
    }
}

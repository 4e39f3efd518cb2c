//! An in-process transport for tests.
//!
//! [`LoopbackConnector`] hands out links that never touch the network. Each
//! call to `connect` creates a [`LoopbackPeer`] through which a test plays the
//! far end: completing the handshake, delivering frames, reporting errors and
//! inspecting what the session sent.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{NetworkError, Result};
use crate::websocket::{CloseReason, Connector, EventSink, Link, SessionConfig};

/// A [`Connector`] whose links are driven by the test.
#[derive(Clone, Debug, Default)]
pub struct LoopbackConnector {
    peers: Arc<Mutex<Vec<LoopbackPeer>>>,
}

impl LoopbackConnector {
    /// Create a connector with no peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// All peers created so far, in connect order.
    pub fn peers(&self) -> Vec<LoopbackPeer> {
        self.peers.lock().clone()
    }

    /// The peer created by the `index`th connect.
    pub fn peer(&self, index: usize) -> Option<LoopbackPeer> {
        self.peers.lock().get(index).cloned()
    }

    /// The most recently created peer.
    pub fn last_peer(&self) -> Option<LoopbackPeer> {
        self.peers.lock().last().cloned()
    }

    /// Number of connects so far.
    pub fn peer_count(&self) -> usize {
        self.peers.lock().len()
    }
}

impl Connector for LoopbackConnector {
    fn connect(&self, config: &SessionConfig, sink: EventSink) -> Box<dyn Link> {
        let peer = LoopbackPeer {
            shared: Arc::new(PeerShared {
                url: config.url.clone(),
                sink,
                sent: Mutex::new(Vec::new()),
                releases: AtomicUsize::new(0),
            }),
        };
        self.peers.lock().push(peer.clone());
        Box::new(LoopbackLink {
            shared: peer.shared.clone(),
        })
    }
}

#[derive(Debug)]
struct PeerShared {
    url: String,
    sink: EventSink,
    sent: Mutex<Vec<String>>,
    releases: AtomicUsize,
}

/// The far end of one loopback link.
#[derive(Clone, Debug)]
pub struct LoopbackPeer {
    shared: Arc<PeerShared>,
}

impl LoopbackPeer {
    /// The URL the session asked for.
    pub fn url(&self) -> &str {
        &self.shared.url
    }

    /// Complete the handshake.
    pub fn accept(&self) {
        self.shared.sink.opened();
    }

    /// Fail the handshake with `error`.
    pub fn reject(&self, error: NetworkError) {
        self.shared.sink.error(error);
        self.shared.sink.closed(CloseReason::abnormal());
    }

    /// Deliver an inbound text frame.
    pub fn deliver(&self, text: impl Into<String>) {
        self.shared.sink.text_received(text.into());
    }

    /// Report a transport error without closing.
    pub fn fail(&self, error: NetworkError) {
        self.shared.sink.error(error);
    }

    /// Close the connection from the far end.
    pub fn hang_up(&self, reason: CloseReason) {
        self.shared.sink.closed(reason);
    }

    /// Every frame the session sent, in order.
    pub fn sent(&self) -> Vec<String> {
        self.shared.sent.lock().clone()
    }

    /// How many times the session released this link.
    pub fn release_count(&self) -> usize {
        self.shared.releases.load(Ordering::SeqCst)
    }

    /// Whether the owning session has been released.
    pub fn is_released(&self) -> bool {
        self.shared.sink.is_released()
    }
}

struct LoopbackLink {
    shared: Arc<PeerShared>,
}

impl Link for LoopbackLink {
    fn send_text(&self, text: String) -> Result<()> {
        self.shared.sent.lock().push(text);
        Ok(())
    }

    fn release(&mut self) {
        self.shared.releases.fetch_add(1, Ordering::SeqCst);
    }
}

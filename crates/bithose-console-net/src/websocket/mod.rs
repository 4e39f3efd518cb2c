//! WebSocket sessions with signal-based event delivery.
//!
//! A [`Session`] owns exactly one connection for its whole life. It never
//! reconnects: once `Closed`, it stays closed, and only a new `Session` opens
//! a new socket.
//!
//! Events reach the owner through [`SessionSignals`]:
//!
//! - `opened` - the handshake completed
//! - `text_received` - a text frame arrived (the exact text)
//! - `error` - the transport reported an error (does not close by itself)
//! - `closed` - the connection ended, locally or remotely
//!
//! # Example
//!
//! ```ignore
//! use bithose_console_net::websocket::{Session, SessionConfig, WebSocketConnector};
//!
//! let session = Session::new(SessionConfig::new("ws://localhost:80/"));
//!
//! session.signals().opened.connect(|_| {
//!     println!("Connected to broker!");
//! });
//!
//! session.signals().text_received.connect(|frame| {
//!     println!("Received: {}", frame);
//! });
//!
//! session.open(&WebSocketConnector::current()?);
//! ```

mod message;
mod session;
mod transport;

pub use message::{CloseCode, CloseReason, SessionState};
pub use session::{EventSink, Session, SessionConfig, SessionId, SessionSignals, parse_endpoint};
pub use transport::{Connector, Link, WebSocketConnector};

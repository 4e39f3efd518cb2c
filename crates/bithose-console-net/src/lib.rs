//! Networking module for Bithose Console.
//!
//! This crate owns everything that touches a socket:
//!
//! - **Session**: one WebSocket connection with a small, terminal state
//!   machine (`Idle → Connecting → Open → Closed`) and signal-based event
//!   delivery
//! - **Transport**: the [`Connector`]/[`Link`] seam a session drives, with a
//!   tokio-tungstenite implementation in [`WebSocketConnector`]
//!
//! # Example
//!
//! ```ignore
//! use bithose_console_net::{Session, SessionConfig, WebSocketConnector};
//!
//! let connector = WebSocketConnector::current()?;
//! let session = Session::new(SessionConfig::new("ws://localhost:80/"));
//!
//! session.signals().opened.connect(|_| println!("websocket open"));
//! session.signals().text_received.connect(|frame| println!("{frame}"));
//!
//! session.open(&connector);
//! // ... once open:
//! session.send_text(r#"{"type": "message", "message": {"body": "hi", "label_pairs": []}}"#)?;
//!
//! // Releases the transport; also happens on drop.
//! session.close();
//! ```

mod error;
pub mod websocket;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use websocket::{
    CloseCode, CloseReason, Connector, EventSink, Link, Session, SessionConfig, SessionId,
    SessionSignals, SessionState, WebSocketConnector, parse_endpoint,
};

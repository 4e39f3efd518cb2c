//! Bithose Console: a multi-pane manual test harness for the Bithose
//! label-pair pub/sub broker.
//!
//! Each pane ([`SessionWidget`]) owns one WebSocket session to the broker, an
//! editable outbound buffer ([`PayloadComposer`]) and an append-only
//! [`EventLog`] of everything the session reported. Panes are fully
//! independent; a [`Console`] simply holds several of them next to the event
//! queue their events are delivered on.
//!
//! # Example
//!
//! ```ignore
//! use bithose_console::{Console, ConsoleConfig, Preset};
//! use bithose_console_net::WebSocketConnector;
//!
//! let connector = WebSocketConnector::current()?;
//! let console = Console::mount(&ConsoleConfig::default(), &connector)?;
//!
//! let pane = console.pane(0).unwrap();
//! pane.load_preset(Preset::Subscribe);
//!
//! // Once the pane's log shows "websocket open":
//! console.process_events();
//! pane.send()?;
//! ```

pub mod composer;
pub mod config;
pub mod console;
mod error;
pub mod frame;
pub mod log;
pub mod terminal;
pub mod widget;

pub use composer::{MESSAGE_TEMPLATE, PayloadComposer, Preset, SUBSCRIBE_TEMPLATE};
pub use config::{ConsoleConfig, DeliveryMode};
pub use console::Console;
pub use error::{
    CommandError, ConfigError, ConsoleError, FrameError, Result, SendError, ValidationError,
};
pub use log::{EntryOrigin, EventLog, LogEntry};
pub use widget::SessionWidget;

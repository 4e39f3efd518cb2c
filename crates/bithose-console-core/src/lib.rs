//! Core systems for Bithose Console.
//!
//! This crate provides the foundational pieces every console pane is built on:
//!
//! - **Event Queue**: A single logical queue on which slots, operator input
//!   and log mutation are dispatched in arrival order
//! - **Signal/Slot System**: Type-safe notification between components
//! - **Property System**: Values with change detection
//! - **Logging**: Target names and subscriber setup for `tracing`
//!
//! # Signal/Slot Example
//!
//! ```
//! use bithose_console_core::Signal;
//!
//! let text_received = Signal::<String>::new();
//!
//! let conn_id = text_received.connect(|text| {
//!     println!("Received: {}", text);
//! });
//!
//! text_received.emit("{\"uuid\": \"42\"}".to_string());
//! text_received.disconnect(conn_id);
//! ```
//!
//! # Event Queue Example
//!
//! ```
//! use bithose_console_core::{ConnectionType, EventQueue, Signal};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let queue = EventQueue::new();
//! let opened = Signal::<()>::new();
//! let count = Arc::new(AtomicUsize::new(0));
//!
//! let count_clone = count.clone();
//! opened.connect_with_type(
//!     move |_| {
//!         count_clone.fetch_add(1, Ordering::SeqCst);
//!     },
//!     ConnectionType::Queued(queue.handle()),
//! );
//!
//! opened.emit(());
//! assert_eq!(count.load(Ordering::SeqCst), 0);
//!
//! queue.process_pending();
//! assert_eq!(count.load(Ordering::SeqCst), 1);
//! ```

mod error;
mod event_queue;
pub mod logging;
pub mod property;
pub mod signal;

pub use error::{CoreError, Result};
pub use event_queue::{EventQueue, QueueHandle};
pub use property::Property;
pub use signal::{ConnectionId, ConnectionType, Signal};

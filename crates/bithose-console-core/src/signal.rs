//! Signal/slot system for Bithose Console.
//!
//! Signals are emitted by components when something happens (a socket opened,
//! a frame arrived, a log entry was appended) and connected slots (callbacks)
//! are invoked in response.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionType`] - How a slot should be invoked (Direct or Queued)
//!
//! # Connection Types
//!
//! - **Direct**: Slot is called immediately on the emitting thread
//! - **Queued**: Slot execution is posted to an [`EventQueue`](crate::EventQueue)
//!   and runs when that queue is processed
//!
//! Emissions from one thread reach a queued slot in emission order, because
//! the underlying queue is FIFO.
//!
//! # Example
//!
//! ```
//! use bithose_console_core::Signal;
//!
//! let text_changed = Signal::<String>::new();
//!
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! text_changed.emit("Hello, World!".to_string());
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::event_queue::QueueHandle;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// Specifies how a connected slot should be invoked when the signal is emitted.
#[derive(Clone, Debug, Default)]
pub enum ConnectionType {
    /// Invoke the slot immediately on the emitting thread.
    ///
    /// The slot must be safe to call from any thread, since transport
    /// signals are emitted from worker tasks.
    #[default]
    Direct,

    /// Post the slot invocation to an event queue.
    ///
    /// The slot runs on whichever thread processes the queue. If the queue
    /// has shut down the invocation is dropped.
    Queued(QueueHandle),
}

/// The slot function type (Arc-wrapped for cheap capture into queued invocations).
type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Slot<Args>,
    connection_type: ConnectionType,
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync` and can be emitted from any thread. Slots
/// are collected under the connection lock and invoked after it is released,
/// so a slot may connect, disconnect or emit on the same signal.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    blocked: AtomicBool,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal with [`ConnectionType::Direct`].
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_with_type(slot, ConnectionType::Direct)
    }

    /// Connect a slot with a specific connection type.
    ///
    /// # Example
    ///
    /// ```
    /// use bithose_console_core::{ConnectionType, EventQueue, Signal};
    ///
    /// let queue = EventQueue::new();
    /// let signal = Signal::<i32>::new();
    ///
    /// signal.connect_with_type(|n| println!("{}", n), ConnectionType::Direct);
    /// signal.connect_with_type(|n| println!("{}", n), ConnectionType::Queued(queue.handle()));
    ///
    /// signal.emit(42);
    /// queue.process_pending();
    /// ```
    pub fn connect_with_type<F>(&self, slot: F, connection_type: ConnectionType) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
            connection_type,
        };
        self.connections.lock().insert(connection)
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// If the signal is blocked, this does nothing. Direct slots run before
    /// this call returns; queued slots are posted to their queue with a clone
    /// of `args`.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let snapshot: Vec<(Slot<Args>, ConnectionType)> = self
            .connections
            .lock()
            .values()
            .map(|conn| (conn.slot.clone(), conn.connection_type.clone()))
            .collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        for (slot, connection_type) in snapshot {
            match connection_type {
                ConnectionType::Direct => slot(&args),
                ConnectionType::Queued(queue) => {
                    let args = args.clone();
                    if queue.post(move || slot(&args)).is_err() {
                        tracing::warn!(
                            target: targets::SIGNAL,
                            "event queue has shut down, dropping queued slot invocation"
                        );
                    }
                }
            }
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

//! Single logical event queue for deferred slot invocations.
//!
//! Transport tasks run on worker threads, but everything that touches a
//! pane's state is funnelled through one [`EventQueue`] and executed by
//! whichever thread drives it (normally the main thread). Queued signal
//! connections, operator input and timers all post here, so they run one
//! at a time in the order they were posted.
//!
//! # How It Works
//!
//! 1. A producer holding a [`QueueHandle`] posts a closure.
//! 2. The closure is appended to an unbounded FIFO channel.
//! 3. The owner of the [`EventQueue`] executes closures either in a blocking
//!    loop ([`EventQueue::run`]) or by draining what is currently pending
//!    ([`EventQueue::process_pending`]).

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::{CoreError, Result};
use crate::logging::targets;

/// A boxed invocation closure.
type BoxedInvocation = Box<dyn FnOnce() + Send + 'static>;

enum Invocation {
    Run(BoxedInvocation),
    Quit,
}

/// The receiving side of the event queue.
///
/// Exactly one `EventQueue` exists per console; it is not `Clone`. Producers
/// obtain a [`QueueHandle`] via [`handle`](Self::handle).
pub struct EventQueue {
    sender: Sender<Invocation>,
    receiver: Receiver<Invocation>,
    quit_requested: AtomicBool,
}

impl EventQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            quit_requested: AtomicBool::new(false),
        }
    }

    /// Get a cloneable handle for posting invocations from any thread.
    pub fn handle(&self) -> QueueHandle {
        QueueHandle {
            sender: self.sender.clone(),
        }
    }

    /// Post an invocation from the owning thread.
    pub fn post<F>(&self, invocation: F)
    where
        F: FnOnce() + Send + 'static,
    {
        // The receiver lives as long as `self`, so this cannot fail.
        let _ = self.sender.send(Invocation::Run(Box::new(invocation)));
    }

    /// Number of invocations waiting to run.
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Whether a quit request has been processed.
    pub fn should_quit(&self) -> bool {
        self.quit_requested.load(Ordering::SeqCst)
    }

    /// Execute every invocation currently pending, including ones posted while
    /// draining.
    ///
    /// Returns the number of invocations executed. A quit request stops the
    /// drain and is remembered for [`should_quit`](Self::should_quit).
    pub fn process_pending(&self) -> usize {
        let mut processed = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(Invocation::Run(invocation)) => {
                    invocation();
                    processed += 1;
                }
                Ok(Invocation::Quit) => {
                    self.quit_requested.store(true, Ordering::SeqCst);
                    break;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if processed > 0 {
            tracing::trace!(target: targets::EVENT_QUEUE, processed, "drained event queue");
        }
        processed
    }

    /// Run invocations until a quit request arrives.
    pub fn run(&self) {
        tracing::debug!(target: targets::EVENT_QUEUE, "event queue running");
        while !self.should_quit() {
            match self.receiver.recv() {
                Ok(Invocation::Run(invocation)) => invocation(),
                Ok(Invocation::Quit) | Err(_) => {
                    self.quit_requested.store(true, Ordering::SeqCst);
                }
            }
        }
        tracing::debug!(target: targets::EVENT_QUEUE, "event queue stopped");
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending_count())
            .field("quit_requested", &self.should_quit())
            .finish()
    }
}

/// A cloneable, thread-safe producer handle for an [`EventQueue`].
#[derive(Clone)]
pub struct QueueHandle {
    sender: Sender<Invocation>,
}

impl QueueHandle {
    /// Post an invocation to run on the queue's thread.
    ///
    /// Fails with [`CoreError::QueueClosed`] once the queue has been dropped.
    pub fn post<F>(&self, invocation: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Invocation::Run(Box::new(invocation)))
            .map_err(|_| CoreError::QueueClosed)
    }

    /// Ask the queue to stop after the invocations posted before this call.
    pub fn quit(&self) -> Result<()> {
        tracing::info!(target: targets::EVENT_QUEUE, "quit requested");
        self.sender
            .send(Invocation::Quit)
            .map_err(|_| CoreError::QueueClosed)
    }
}

impl std::fmt::Debug for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle").finish_non_exhaustive()
    }
}

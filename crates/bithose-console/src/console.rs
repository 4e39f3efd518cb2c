//! The set of panes.

use std::fmt;
use std::sync::Arc;

use bithose_console_core::logging::targets;
use bithose_console_core::{ConnectionType, EventQueue, QueueHandle};
use bithose_console_net::Connector;

use crate::config::{ConsoleConfig, DeliveryMode};
use crate::error::ConfigError;
use crate::widget::SessionWidget;

/// N independent panes plus the event queue their events are delivered on.
///
/// With [`DeliveryMode::Queued`], nothing a session reports touches a log
/// until [`process_events`](Self::process_events) (or whoever runs the queue)
/// dispatches it.
pub struct Console {
    queue: Arc<EventQueue>,
    panes: Vec<SessionWidget>,
}

impl Console {
    /// Mount `config.panes` panes, each opening its own session through
    /// `connector`.
    pub fn mount(config: &ConsoleConfig, connector: &dyn Connector) -> Result<Self, ConfigError> {
        config.validate()?;
        let session_config = config.session_config()?;
        let queue = Arc::new(EventQueue::new());

        let delivery = match config.delivery {
            DeliveryMode::Queued => ConnectionType::Queued(queue.handle()),
            DeliveryMode::Direct => ConnectionType::Direct,
        };

        tracing::info!(
            target: targets::CONSOLE,
            panes = config.panes,
            endpoint = %session_config.url,
            delivery = ?config.delivery,
            "mounting console"
        );

        let panes = (0..config.panes)
            .map(|index| {
                SessionWidget::mount(index, session_config.clone(), connector, delivery.clone())
            })
            .collect();

        Ok(Self { queue, panes })
    }

    /// The queue session events are delivered on.
    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// A handle for posting work to the queue from other threads.
    pub fn handle(&self) -> QueueHandle {
        self.queue.handle()
    }

    /// The pane at `index`.
    pub fn pane(&self, index: usize) -> Option<&SessionWidget> {
        self.panes.get(index)
    }

    /// All panes, in order.
    pub fn panes(&self) -> &[SessionWidget] {
        &self.panes
    }

    /// Number of panes.
    pub fn len(&self) -> usize {
        self.panes.len()
    }

    /// Returns `true` if there are no panes.
    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    /// Dispatch every queued event. Returns how many ran.
    pub fn process_events(&self) -> usize {
        self.queue.process_pending()
    }

    /// Close every pane's session. Returns how many were released by this call.
    pub fn close_all(&self) -> usize {
        let released = self.panes.iter().filter(|pane| pane.close()).count();
        tracing::debug!(target: targets::CONSOLE, released, "closed all panes");
        released
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("panes", &self.panes)
            .field("queue", &self.queue)
            .finish()
    }
}

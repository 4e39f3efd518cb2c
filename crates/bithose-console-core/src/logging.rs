//! Logging facilities for Bithose Console.
//!
//! All crates in the workspace log through `tracing` with the targets below,
//! so a filter such as `bithose_console_net::session=debug` narrows output to
//! one subsystem.
//!
//! Libraries never install a subscriber. Binaries call [`init_tracing`] once
//! at startup:
//!
//! ```ignore
//! bithose_console_core::logging::init_tracing("info")?;
//! ```
//!
//! Log output goes to stderr so it never interleaves with pane output on
//! stdout.

use tracing_subscriber::EnvFilter;

use crate::error::{CoreError, Result};

/// Target names for log filtering.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "bithose_console_core";
    /// Event queue target.
    pub const EVENT_QUEUE: &str = "bithose_console_core::event_queue";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "bithose_console_core::signal";
    /// Session state machine target.
    pub const SESSION: &str = "bithose_console_net::session";
    /// WebSocket transport target.
    pub const TRANSPORT: &str = "bithose_console_net::transport";
    /// Pane widget target.
    pub const WIDGET: &str = "bithose_console::widget";
    /// Console (pane set and front-end) target.
    pub const CONSOLE: &str = "bithose_console::console";
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter` when set. Fails if a
/// subscriber has already been installed or the filter does not parse.
pub fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .map_err(|e| CoreError::Logging(format!("invalid filter '{default_filter}': {e}")))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    tracing::debug!(target: targets::CORE, "tracing initialized");
    Ok(())
}

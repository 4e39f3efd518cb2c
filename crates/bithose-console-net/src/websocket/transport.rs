//! The transport seam and its tokio-tungstenite implementation.

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as TungsteniteCloseCode;
use tokio_tungstenite::tungstenite::Message;

use bithose_console_core::logging::targets;

use super::message::{CloseCode, CloseReason};
use super::session::{EventSink, SessionConfig};
use crate::error::{NetworkError, Result};

/// Establishes transport links for sessions.
///
/// `connect` must not block on the network and never fails synchronously:
/// the outcome is reported later through the [`EventSink`].
pub trait Connector: Send + Sync {
    /// Start connecting to `config.url`, reporting events into `sink`.
    fn connect(&self, config: &SessionConfig, sink: EventSink) -> Box<dyn Link>;
}

/// A session's handle on one live transport.
pub trait Link: Send {
    /// Queue `text` for transmission as a single text frame.
    fn send_text(&self, text: String) -> Result<()>;

    /// Tear the transport down. Called exactly once, by the owning session.
    fn release(&mut self);
}

/// Commands sent from a link to its transport task.
#[derive(Debug)]
enum Command {
    SendText(String),
    Close(CloseReason),
}

/// [`Connector`] backed by tokio-tungstenite.
///
/// Each link runs as one task on the given runtime.
#[derive(Clone, Debug)]
pub struct WebSocketConnector {
    handle: Handle,
}

impl WebSocketConnector {
    /// Create a connector that spawns link tasks on `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Create a connector for the runtime the caller is running in.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| NetworkError::Runtime(e.to_string()))
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self, config: &SessionConfig, sink: EventSink) -> Box<dyn Link> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        self.handle.spawn(run_link(config.clone(), sink, command_rx));
        Box::new(WebSocketLink {
            commands: command_tx,
        })
    }
}

struct WebSocketLink {
    commands: mpsc::UnboundedSender<Command>,
}

impl Link for WebSocketLink {
    fn send_text(&self, text: String) -> Result<()> {
        self.commands
            .send(Command::SendText(text))
            .map_err(|_| NetworkError::NotOpen)
    }

    fn release(&mut self) {
        // The task may already be gone after a remote close.
        let _ = self.commands.send(Command::Close(CloseReason::normal()));
    }
}

async fn run_link(
    config: SessionConfig,
    sink: EventSink,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let request = match config.url.as_str().into_client_request() {
        Ok(request) => request,
        Err(e) => {
            sink.error(e.into());
            sink.closed(CloseReason::abnormal());
            return;
        }
    };

    let handshake = tokio::time::timeout(
        config.handshake_timeout,
        tokio_tungstenite::connect_async(request),
    );

    let stream = tokio::select! {
        result = handshake => match result {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                tracing::debug!(target: targets::TRANSPORT, url = %config.url, error = %e, "handshake failed");
                sink.error(e.into());
                sink.closed(CloseReason::abnormal());
                return;
            }
            Err(_) => {
                tracing::debug!(target: targets::TRANSPORT, url = %config.url, "handshake timed out");
                sink.error(NetworkError::Timeout);
                sink.closed(CloseReason::abnormal());
                return;
            }
        },
        // Released while still connecting.
        _ = commands.recv() => {
            tracing::debug!(target: targets::TRANSPORT, url = %config.url, "released during handshake");
            return;
        }
    };

    tracing::debug!(target: targets::TRANSPORT, url = %config.url, "handshake complete");
    sink.opened();

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(Command::SendText(text)) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            sink.error(e.into());
                            sink.closed(CloseReason::abnormal());
                            return;
                        }
                    }
                    Some(Command::Close(reason)) => {
                        let frame = CloseFrame {
                            code: to_tungstenite_close_code(reason.code),
                            reason: reason.reason.unwrap_or_default().into(),
                        };
                        let _ = write.send(Message::Close(Some(frame))).await;
                        tracing::debug!(target: targets::TRANSPORT, url = %config.url, "link released");
                        return;
                    }
                    None => {
                        let _ = write.send(Message::Close(None)).await;
                        return;
                    }
                }
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        sink.text_received(text.to_string());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        tracing::debug!(target: targets::TRANSPORT, len = data.len(), "ignoring binary frame");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                        // Pings are answered by tungstenite.
                    }
                    Some(Ok(Message::Close(frame))) => {
                        // Flush the queued close reply.
                        let _ = write.flush().await;
                        let reason = frame
                            .map(CloseReason::from)
                            .unwrap_or_else(|| CloseReason::new(CloseCode::NoStatus));
                        sink.closed(reason);
                        return;
                    }
                    Some(Err(e)) => {
                        sink.error(e.into());
                        sink.closed(CloseReason::abnormal());
                        return;
                    }
                    None => {
                        sink.closed(CloseReason::abnormal());
                        return;
                    }
                }
            }
        }
    }
}

fn to_tungstenite_close_code(code: CloseCode) -> TungsteniteCloseCode {
    TungsteniteCloseCode::from(code.as_u16())
}

impl From<CloseFrame> for CloseReason {
    fn from(frame: CloseFrame) -> Self {
        let reason = frame.reason.as_str().to_owned();
        Self {
            code: CloseCode::from_u16(u16::from(frame.code)),
            reason: (!reason.is_empty()).then_some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_code_round_trips_through_tungstenite() {
        for code in [CloseCode::Normal, CloseCode::Away, CloseCode::Error, CloseCode::Custom(4000)] {
            let converted = to_tungstenite_close_code(code);
            assert_eq!(CloseCode::from_u16(u16::from(converted)), code);
        }
    }

    #[test]
    fn test_close_reason_from_frame() {
        let reason = CloseReason::from(CloseFrame {
            code: TungsteniteCloseCode::Away,
            reason: String::from("bye").into(),
        });
        assert_eq!(reason, CloseReason::with_reason(CloseCode::Away, "bye"));

        let reason = CloseReason::from(CloseFrame {
            code: TungsteniteCloseCode::Normal,
            reason: String::new().into(),
        });
        assert_eq!(reason, CloseReason::normal());
    }

    #[test]
    fn test_current_requires_runtime() {
        assert!(matches!(WebSocketConnector::current(), Err(NetworkError::Runtime(_))));
    }
}

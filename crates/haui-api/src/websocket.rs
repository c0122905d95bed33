//! A single WebSocket session with the hub.
//!
//! [`Session::spawn`] opens one connection and runs it on a background task
//! that owns both halves of the socket. Parsed inbound frames and lifecycle
//! changes are delivered as [`SessionEvent`]s through an unbounded channel;
//! outbound frames are queued through the returned [`SessionSender`].
//!
//! Reconnection is not handled here. When the socket drops the session
//! emits [`SessionEvent::Closed`] exactly once and the task exits; the
//! caller decides whether and when to open a new session.
//!
//! # Example
//!
//! ```rust,ignore
//! use haui_api::websocket::{Session, SessionEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let url = url::Url::parse("ws://hub.local:8123/api/websocket")?;
//! let sender = Session::spawn(url, tx, CancellationToken::new());
//!
//! while let Some(event) = rx.recv().await {
//!     if let SessionEvent::Closed { .. } = event {
//!         break;
//!     }
//! }
//! sender.shutdown();
//! ```

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{InboundMessage, OutboundMessage, parse_inbound};

// ── SessionEvent ─────────────────────────────────────────────────────

/// Lifecycle and message notifications from a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The socket is open; nothing has been exchanged yet.
    Opened,

    /// A well-formed inbound frame.
    Message(InboundMessage),

    /// The session ended. `error` is `None` for a clean close.
    Closed { error: Option<String> },
}

// ── SessionSender ────────────────────────────────────────────────────

/// Cloneable handle for queueing frames on a running session.
#[derive(Debug, Clone)]
pub struct SessionSender {
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

impl SessionSender {
    /// Serialize and queue a message for the writer.
    ///
    /// Fails only when the session task has already exited.
    pub fn send(&self, message: &OutboundMessage) -> Result<(), Error> {
        let text = serde_json::to_string(message)?;

        tracing::trace!(kind = message.kind(), id = ?message.id(), "queueing frame");

        self.outbound
            .send(text)
            .map_err(|_| Error::WebSocketSend("session is closed".into()))
    }

    /// Whether the session task has exited.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    /// Ask the session to send a close frame and exit.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Entry point for opening a session.
pub struct Session;

impl Session {
    /// Spawn a task that connects to `url` and runs until the socket
    /// closes or `cancel` fires.
    ///
    /// Returns immediately. A failed connect is reported as
    /// [`SessionEvent::Closed`] with an error, never as a panic.
    pub fn spawn(
        url: Url,
        events: mpsc::UnboundedSender<SessionEvent>,
        cancel: CancellationToken,
    ) -> SessionSender {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let error = run_session(&url, &events, outbound_rx, &task_cancel)
                .await
                .err()
                .map(|e| e.to_string());

            if let Some(ref e) = error {
                tracing::warn!(error = %e, "WebSocket session ended with error");
            } else {
                tracing::info!("WebSocket session closed");
            }
            let _ = events.send(SessionEvent::Closed { error });
        });

        SessionSender {
            outbound: outbound_tx,
            cancel,
        }
    }
}

// ── Connection lifecycle ─────────────────────────────────────────────

/// Connect, then pump frames in both directions until the socket drops.
async fn run_session(
    url: &Url,
    events: &mpsc::UnboundedSender<SessionEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "Connecting to WebSocket");

    let connect = tokio_tungstenite::connect_async(url.as_str());
    let (ws_stream, _response) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Ok(()),
        result = connect => result.map_err(|e| Error::WebSocketConnect(e.to_string()))?,
    };

    tracing::info!("WebSocket connected");
    let _ = events.send(SessionEvent::Opened);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // Frames queued before shutdown still go out.
                while let Ok(text) = outbound.try_recv() {
                    if write.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "close frame not delivered");
                }
                return Ok(());
            }
            Some(text) = outbound.recv() => {
                if let Err(e) = write.send(Message::text(text)).await {
                    tracing::warn!(error = %e, "WebSocket write failed");
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => dispatch_text(&text, events),
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite queues the pong; it goes out on the next write
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Parse one text frame and forward it. Malformed frames are dropped.
fn dispatch_text(text: &str, events: &mpsc::UnboundedSender<SessionEvent>) {
    match parse_inbound(text) {
        Ok(InboundMessage::Unknown) => {
            tracing::trace!("ignoring frame with unrecognized type");
        }
        Ok(message) => {
            let _ = events.send(SessionEvent::Message(message));
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse WebSocket frame");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

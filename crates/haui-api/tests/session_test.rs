#![allow(clippy::unwrap_used)]
// Session tests against an in-process WebSocket server.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use haui_api::{InboundMessage, OutboundMessage, Session, SessionEvent};

// ── Helpers ─────────────────────────────────────────────────────────

/// Accept a single connection, greet it, echo the next client frame back
/// as a result, then close.
async fn spawn_hub() -> (Url, tokio::task::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        let mut received = Vec::new();

        ws.send(Message::text(r#"{"type":"auth_required","ha_version":"2024.6"}"#))
            .await
            .unwrap();
        // Garbage in the middle of the stream must not end the session.
        ws.send(Message::text("not json")).await.unwrap();

        if let Some(Ok(Message::Text(text))) = ws.next().await {
            received.push(text.to_string());
        }

        ws.send(Message::text(r#"{"type":"auth_ok","ha_version":"2024.6"}"#))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
        received
    });

    let url = Url::parse(&format!("ws://{addr}/api/websocket")).unwrap();
    (url, handle)
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_round_trip_and_single_close() {
    let (url, hub) = spawn_hub().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sender = Session::spawn(url, tx, CancellationToken::new());

    assert_eq!(rx.recv().await.unwrap(), SessionEvent::Opened);
    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::Message(InboundMessage::AuthRequired {
            ha_version: Some("2024.6".into())
        })
    );

    sender
        .send(&OutboundMessage::Auth {
            access_token: "abc".into(),
        })
        .unwrap();

    assert_eq!(
        rx.recv().await.unwrap(),
        SessionEvent::Message(InboundMessage::AuthOk {
            ha_version: Some("2024.6".into())
        })
    );

    let closed = rx.recv().await.unwrap();
    assert!(matches!(closed, SessionEvent::Closed { .. }), "{closed:?}");
    assert!(rx.recv().await.is_none(), "Closed must be the last event");

    let received = hub.await.unwrap();
    assert_eq!(received, vec![r#"{"type":"auth","access_token":"abc"}"#.to_string()]);
}

#[tokio::test]
async fn test_shutdown_closes_cleanly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let url = Url::parse(&format!("ws://{addr}/api/websocket")).unwrap();
    let sender = Session::spawn(url, tx, CancellationToken::new());

    assert_eq!(rx.recv().await.unwrap(), SessionEvent::Opened);
    sender.shutdown();

    assert_eq!(rx.recv().await.unwrap(), SessionEvent::Closed { error: None });
    assert!(rx.recv().await.is_none());
    assert!(
        sender
            .send(&OutboundMessage::GetStates { id: 2 })
            .is_err()
    );
}

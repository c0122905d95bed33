#![allow(clippy::unwrap_used)]
// End-to-end tests for `HubClient` against an in-process fake hub.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use haui_core::{ConnectionState, EntityState, HubClient, HubConfig, HubEvent, SliderKind};

const WAIT: Duration = Duration::from_secs(5);

// ── Fake hub ────────────────────────────────────────────────────────

enum Frame {
    Json(Value),
    Raw(String),
    Close,
}

/// One accepted client connection, driven by the test.
struct HubConn {
    inbox: mpsc::UnboundedReceiver<Value>,
    outbox: mpsc::UnboundedSender<Frame>,
}

impl HubConn {
    fn send(&self, value: Value) {
        self.outbox.send(Frame::Json(value)).unwrap();
    }

    fn send_raw(&self, text: &str) {
        self.outbox.send(Frame::Raw(text.to_owned())).unwrap();
    }

    fn close(&self) {
        self.outbox.send(Frame::Close).unwrap();
    }

    async fn recv(&mut self) -> Value {
        tokio::time::timeout(WAIT, self.inbox.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("client connection closed")
    }
}

async fn spawn_hub() -> (Url, mpsc::UnboundedReceiver<HubConn>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (conn_tx, conn_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            let (in_tx, in_rx) = mpsc::unbounded_channel();
            let (out_tx, mut out_rx) = mpsc::unbounded_channel();
            let _ = conn_tx.send(HubConn {
                inbox: in_rx,
                outbox: out_tx,
            });

            tokio::spawn(async move {
                let (mut sink, mut stream) = ws.split();
                loop {
                    tokio::select! {
                        frame = out_rx.recv() => match frame {
                            Some(Frame::Json(v)) => {
                                let _ = sink.send(Message::text(v.to_string())).await;
                            }
                            Some(Frame::Raw(s)) => {
                                let _ = sink.send(Message::text(s)).await;
                            }
                            Some(Frame::Close) | None => {
                                let _ = sink.send(Message::Close(None)).await;
                                break;
                            }
                        },
                        msg = stream.next() => match msg {
                            Some(Ok(Message::Text(text))) => {
                                let value: Value = serde_json::from_str(&text).unwrap();
                                let _ = in_tx.send(value);
                            }
                            Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                    }
                }
            });
        }
    });

    (Url::parse(&format!("http://{addr}")).unwrap(), conn_rx)
}

// ── Helpers ─────────────────────────────────────────────────────────

fn client(url: Url, reconnect_delay: Duration) -> (HubClient, mpsc::UnboundedReceiver<HubEvent>) {
    let mut config = HubConfig::new(url, "secret-token".to_string().into()).unwrap();
    config.reconnect_delay = reconnect_delay;
    config.debounce = Duration::from_millis(50);
    let client = HubClient::new(config);
    let events = client.take_events().unwrap();
    (client, events)
}

async fn next_conn(hubs: &mut mpsc::UnboundedReceiver<HubConn>) -> HubConn {
    tokio::time::timeout(WAIT, hubs.recv())
        .await
        .expect("timed out waiting for connection")
        .unwrap()
}

/// Wait for the first event matching `pred`, skipping others.
async fn expect_event(
    events: &mut mpsc::UnboundedReceiver<HubEvent>,
    pred: impl Fn(&HubEvent) -> bool,
) -> HubEvent {
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Drive a fresh connection through auth, subscribe and snapshot request.
async fn handshake(
    hubs: &mut mpsc::UnboundedReceiver<HubConn>,
    events: &mut mpsc::UnboundedReceiver<HubEvent>,
) -> (HubConn, u64, u64) {
    let mut conn = next_conn(hubs).await;
    conn.send(json!({ "type": "auth_required", "ha_version": "2024.6.0" }));

    let auth = conn.recv().await;
    assert_eq!(auth, json!({ "type": "auth", "access_token": "secret-token" }));

    conn.send(json!({ "type": "auth_ok", "ha_version": "2024.6.0" }));
    expect_event(events, |e| *e == HubEvent::Authenticated).await;

    let subscribe = conn.recv().await;
    assert_eq!(subscribe["type"], "subscribe_events");
    assert_eq!(subscribe["event_type"], "state_changed");
    let get_states = conn.recv().await;
    assert_eq!(get_states["type"], "get_states");

    (
        conn,
        subscribe["id"].as_u64().unwrap(),
        get_states["id"].as_u64().unwrap(),
    )
}

// ── Handshake ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_handshake_subscribes_before_snapshot() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let (_conn, subscribe_id, snapshot_id) = handshake(&mut hubs, &mut events).await;

    assert_eq!(subscribe_id, 2);
    assert_eq!(snapshot_id, 3);
    assert_eq!(client.state(), ConnectionState::Authenticated);
}

#[tokio::test]
async fn test_auth_invalid_is_surfaced() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let mut conn = next_conn(&mut hubs).await;
    conn.recv().await;
    conn.send(json!({ "type": "auth_invalid", "message": "Invalid access token" }));
    conn.close();

    let rejected = expect_event(&mut events, |e| matches!(e, HubEvent::AuthRejected { .. })).await;
    assert_eq!(
        rejected,
        HubEvent::AuthRejected {
            message: "Invalid access token".into()
        }
    );
    expect_event(&mut events, |e| *e == HubEvent::Disconnected).await;
    client.shutdown();
}

// ── State sync ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_and_events_fill_cache() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let (conn, _, snapshot_id) = handshake(&mut hubs, &mut events).await;

    conn.send(json!({
        "id": snapshot_id,
        "type": "result",
        "success": true,
        "result": [
            { "entity_id": "light.x", "state": "off", "attributes": { "friendly_name": "X" } },
            { "entity_id": "switch.y", "state": "on", "attributes": {} },
            { "entity_id": "sensor.z", "state": "21.5", "attributes": { "unit_of_measurement": "°C" } }
        ]
    }));

    let applied = expect_event(&mut events, |e| matches!(e, HubEvent::SnapshotApplied { .. })).await;
    assert_eq!(applied, HubEvent::SnapshotApplied { count: 3 });
    assert_eq!(client.cache().len(), 3);

    let new_state = json!({ "state": "on", "attributes": { "brightness": 180 } });
    conn.send(json!({
        "id": 2,
        "type": "event",
        "event": {
            "event_type": "state_changed",
            "data": { "entity_id": "light.x", "new_state": new_state }
        }
    }));

    let changed = expect_event(&mut events, |e| {
        matches!(
            e,
            HubEvent::StateChanged { entity_id, state }
                if entity_id.as_str() == "light.x" && state.is_on()
        )
    })
    .await;
    let HubEvent::StateChanged { entity_id, state } = changed else {
        unreachable!()
    };
    let expected: EntityState = serde_json::from_value(new_state).unwrap();
    assert_eq!(entity_id.as_str(), "light.x");
    assert_eq!(*state, expected);
    // Full replace: the snapshot's friendly_name is gone.
    assert_eq!(client.cache().get("light.x").unwrap().friendly_name(), None);
    client.shutdown();
}

#[tokio::test]
async fn test_malformed_frame_keeps_session_alive() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let (conn, _, _) = handshake(&mut hubs, &mut events).await;

    conn.send_raw("{ definitely not json");
    conn.send(json!({ "type": "event", "event": { "data": { "no_entity": true } } }));
    conn.send(json!({
        "type": "event",
        "event": { "data": { "entity_id": "fan.attic", "new_state": { "state": "on" } } }
    }));

    expect_event(&mut events, |e| {
        matches!(e, HubEvent::StateChanged { entity_id, .. } if entity_id.as_str() == "fan.attic")
    })
    .await;
    assert_eq!(client.state(), ConnectionState::Authenticated);
    client.shutdown();
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_service_call_results_are_routed() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let (mut conn, _, _) = handshake(&mut hubs, &mut events).await;

    let mut data = serde_json::Map::new();
    data.insert("brightness".into(), json!(180));
    let id = client
        .call_service("light", "turn_on", "light.kitchen".into(), data)
        .unwrap();
    assert_eq!(id, 4);

    let frame = conn.recv().await;
    assert_eq!(
        frame,
        json!({
            "id": 4,
            "type": "call_service",
            "domain": "light",
            "service": "turn_on",
            "service_data": { "brightness": 180, "entity_id": "light.kitchen" }
        })
    );

    conn.send(json!({
        "id": 4,
        "type": "result",
        "success": false,
        "error": { "code": "service_not_found", "message": "Service not found." }
    }));
    let failed = expect_event(&mut events, |e| matches!(e, HubEvent::CommandFailed { .. })).await;
    assert_eq!(
        failed,
        HubEvent::CommandFailed {
            id: 4,
            code: Some("service_not_found".into()),
            message: "Service not found.".into()
        }
    );

    let id = client
        .call_service("switch", "turn_off", "switch.pump".into(), serde_json::Map::new())
        .unwrap();
    conn.recv().await;
    conn.send(json!({ "id": id, "type": "result", "success": true, "result": { "context": {} } }));
    let done = expect_event(&mut events, |e| matches!(e, HubEvent::CommandCompleted { .. })).await;
    assert_eq!(done, HubEvent::CommandCompleted { id });
    client.shutdown();
}

#[tokio::test]
async fn test_slider_burst_sends_one_command() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let (mut conn, _, _) = handshake(&mut hubs, &mut events).await;

    for value in [20, 90, 160, 0] {
        client
            .dispatch(&SliderKind::Brightness.command("light.desk".into(), value))
            .unwrap();
    }

    let frame = conn.recv().await;
    assert_eq!(frame["service"], "turn_off");
    assert_eq!(frame["service_data"], json!({ "entity_id": "light.desk" }));

    // Nothing else follows the single debounced call.
    let extra = tokio::time::timeout(Duration::from_millis(300), conn.inbox.recv()).await;
    assert!(extra.is_err(), "unexpected extra frame: {extra:?}");
    client.shutdown();
}

#[tokio::test]
async fn test_calls_are_dropped_while_disconnected() {
    let (url, _hubs) = spawn_hub().await;
    let (client, _events) = client(url, Duration::from_secs(10));

    assert_eq!(client.state(), ConnectionState::Disconnected);
    let sent = client.call_service("light", "turn_on", "light.x".into(), serde_json::Map::new());
    assert_eq!(sent, None);
}

#[tokio::test]
async fn test_calls_wait_for_the_token_to_be_accepted() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    let mut conn = next_conn(&mut hubs).await;
    let auth = conn.recv().await;
    assert_eq!(auth["type"], "auth");
    assert_eq!(client.state(), ConnectionState::Connected);

    let sent = client.call_service("light", "turn_on", "light.x".into(), serde_json::Map::new());
    assert_eq!(sent, None);

    // The first frame after auth_ok is the subscription, not the early call.
    conn.send(json!({ "type": "auth_ok", "ha_version": "2024.6.0" }));
    expect_event(&mut events, |e| *e == HubEvent::Authenticated).await;
    let subscribe = conn.recv().await;
    assert_eq!(subscribe["type"], "subscribe_events");
    assert_eq!(subscribe["id"], 2);
    client.shutdown();
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_is_noop_while_active() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_secs(10));

    client.connect();
    client.connect();
    let (_conn, _, _) = handshake(&mut hubs, &mut events).await;
    client.connect();

    let second = tokio::time::timeout(Duration::from_millis(300), hubs.recv()).await;
    assert!(second.is_err(), "a second session was opened");
    client.shutdown();
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_millis(200));

    client.connect();
    let (conn, _, _) = handshake(&mut hubs, &mut events).await;
    conn.close();

    expect_event(&mut events, |e| *e == HubEvent::Disconnected).await;
    assert_eq!(client.state(), ConnectionState::Disconnected);

    // The fresh session goes through the whole handshake again, with new ids.
    let (_conn, subscribe_id, _) = handshake(&mut hubs, &mut events).await;
    assert!(subscribe_id > 3);
    client.shutdown();
}

#[tokio::test]
async fn test_shutdown_stops_reconnecting() {
    let (url, mut hubs) = spawn_hub().await;
    let (client, mut events) = client(url, Duration::from_millis(100));

    client.connect();
    let (_conn, _, _) = handshake(&mut hubs, &mut events).await;
    client.shutdown();

    expect_event(&mut events, |e| *e == HubEvent::Disconnected).await;
    let again = tokio::time::timeout(Duration::from_millis(400), hubs.recv()).await;
    assert!(again.is_err(), "client reconnected after shutdown");
}

// Integration tests for the /api/ws subscription over a real socket

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use trafficgrid::api::{create_router, AppState};
use trafficgrid::{Broadcaster, ControllerState};

// ── Helpers ───────────────────────────────────────────────────────────────────

async fn start_controller() -> (Arc<ControllerState>, String) {
    let state = Arc::new(ControllerState::default());
    let broadcaster = Broadcaster::new(Arc::clone(&state), Duration::from_millis(20));
    let router = create_router(AppState {
        state: Arc::clone(&state),
        broadcaster,
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/api/ws", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (state, url)
}

fn parse_text(message: Message) -> Value {
    match message {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// First frame is the full view tagged initial_data, then updates follow steps
#[tokio::test]
async fn test_ws_initial_data_then_update() {
    let (state, url) = start_controller().await;
    state.register("North", "http://localhost:5101", "worker-1");

    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();

    let first = timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("no frame within 2s")
        .unwrap()
        .unwrap();
    let event = parse_text(first);

    assert_eq!(event["type"], "initial_data");
    assert_eq!(event["status"], "inactive");
    assert_eq!(event["step"], 0);
    assert_eq!(event["total_count"], 0);
    assert_eq!(event["worker_count"], 1);
    assert!(event["zones"]["North"]["entities"].as_array().unwrap().is_empty());
    assert!(event["history"].as_array().unwrap().is_empty());
    assert_eq!(event["workers"]["North"]["instance_id"], "worker-1");

    let (step, _) = state.begin_cycle();
    state.finish_cycle(step);

    let next = timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("no update within 2s")
        .unwrap()
        .unwrap();
    let event = parse_text(next);

    assert_eq!(event["type"], "update");
    assert_eq!(event["step"], 1);
    assert_eq!(event["history"][0]["step"], 1);
}

/// Client close ends the subscription and the server closes the socket
#[tokio::test]
async fn test_ws_client_close_ends_subscription() {
    let (_state, url) = start_controller().await;

    let (mut socket, _) = connect_async(url.as_str()).await.unwrap();
    let first = timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("no frame within 2s")
        .unwrap()
        .unwrap();
    assert_eq!(parse_text(first)["type"], "initial_data");

    socket.send(Message::Close(None)).await.unwrap();

    let closed = timeout(Duration::from_secs(2), async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return true,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;

    assert!(matches!(closed, Ok(true)), "socket still open after close");
}

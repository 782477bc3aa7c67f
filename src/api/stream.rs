use crate::api::AppState;
use crate::state::AggregateStateView;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{
        sse::{Event, KeepAlive, Sse},
        Json, Response,
    },
};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{error, info, warn};

/// GET /api/status - Current aggregate as a single document
pub(crate) async fn status(State(app): State<Arc<AppState>>) -> Json<AggregateStateView> {
    Json(app.state.view())
}

/// GET /api/stream - Server-Sent Events, one JSON event per emission
pub(crate) async fn stream_events(
    State(app): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("Stream subscriber connected");

    let events = app
        .broadcaster
        .subscribe()
        .map(|event| Event::default().json_data(&event));

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// GET /api/ws - Same event sequence over a WebSocket
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, app))
}

async fn handle_socket(mut socket: WebSocket, app: Arc<AppState>) {
    info!("WebSocket subscriber connected");

    let mut events = Box::pin(app.broadcaster.subscribe());

    loop {
        tokio::select! {
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            error!(error = %e, "Failed to send pong");
                            break;
                        }
                    }
                    Some(Ok(_)) => {
                        // Subscribers have nothing to say
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            Some(event) = events.next() => {
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        error!(error = %e, "Failed to serialize broadcast event");
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(json)).await {
                    warn!(error = %e, "Failed to send broadcast event");
                    break;
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

//! WebSocket endpoint: one actor per connection.
//!
//! The socket is split in two. A writer task owns the sink and drains the
//! connection's event queue; the reader loop decodes inbound frames and
//! hands them to the coordinator. Closing the socket disconnects the
//! player.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use duel_core::{ClientEvent, Coordinator, EventReceiver};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, info, instrument, warn};

/// `GET /ws`
pub async fn ws_upgrade(State(coordinator): State<Coordinator>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_connection(socket, coordinator))
}

/// Runs a connection until the client goes away.
#[instrument(skip_all)]
pub async fn run_connection(socket: WebSocket, coordinator: Coordinator) {
    let (sink, mut stream) = socket.split();
    let (connection_id, events) = coordinator.connect().into_parts();
    let writer = tokio::spawn(writer_task(sink, events));

    info!(connection_id = %connection_id, "WebSocket connection opened");

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => coordinator.handle(&connection_id, event),
                Err(e) => coordinator.reject_malformed(&connection_id, &e.to_string()),
            },
            Ok(Message::Binary(_)) => {
                coordinator.reject_malformed(&connection_id, "binary frames are not supported")
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Ok(Message::Close(frame)) => {
                info!(connection_id = %connection_id, reason = ?frame, "Client initiated close");
                break;
            }
            Err(e) => {
                warn!(connection_id = %connection_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    if let Some(session_id) = coordinator.disconnect(&connection_id) {
        debug!(connection_id = %connection_id, session_id = %session_id, "Left game on disconnect");
    }

    // Disconnecting closed the queue, so the writer exits once it is drained.
    if let Err(e) = writer.await {
        error!(connection_id = %connection_id, error = %e, "Writer task failed");
    }

    info!(connection_id = %connection_id, "WebSocket connection closed");
}

async fn writer_task(mut sink: SplitSink<WebSocket, Message>, mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                error!(event = event.name(), error = %e, "Failed to encode event");
                continue;
            }
        };
        if sink.send(Message::Text(text.into())).await.is_err() {
            debug!("Socket closed, stopping writer");
            break;
        }
    }
}

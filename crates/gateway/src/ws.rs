//! WebSocket transport for the duplex chat protocol.
//!
//! Each text frame is one JSON event `{"event": "...", "data": ...}`.
//! The connection task multiplexes two sources with `tokio::select!`:
//! outbound events queued by the engine, and inbound frames from the
//! client. Frames from one connection are handled in arrival order.

use axum::extract::State;
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use teammate_core::message::ConnectionId;
use tracing::{debug, warn};

use crate::SharedState;

/// `GET /ws`: upgrade to a duplex chat connection.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: SharedState) {
    let connection = ConnectionId::new();
    let engine = state.engine.clone();
    let mut outbound = engine.on_connect(&connection).await;
    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            // Drain the queue before taking the next frame, so handling a
            // frame never waits on a full queue.
            biased;

            event = outbound.recv() => {
                let Some(event) = event else { break };
                match event.to_frame() {
                    Ok(frame) => {
                        if ws_sender.send(WsMessage::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(connection_id = %connection, event = event.name(), error = %e, "Failed to encode event"),
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        engine.dispatch(&connection, text.as_str()).await;
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(connection_id = %connection, error = %e, "WebSocket receive error");
                        break;
                    }
                    // Binary, ping and pong frames
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    engine.on_disconnect(&connection).await;
}

//! WebSocket event channel
//!
//! GET /ws upgrades to a WebSocket carrying JSON event frames
//! (see [`livepoll_common::events`]). One task per connection relays bus
//! events out and client events in until either side closes.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use livepoll_common::events::{ClientEvent, ServerEvent};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::hub::{Connection, PushHub};
use crate::AppState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_socket(mut socket: WebSocket, hub: Arc<PushHub>) {
    let Connection {
        id,
        mut events,
        greeting,
    } = hub.connect().await;

    if let Some(event) = greeting {
        if send_event(&mut socket, &event).await.is_err() {
            hub.disconnect(id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => match ClientEvent::from_frame(&text) {
                    Ok(event) => {
                        hub.dispatch(id, event).await;
                    }
                    Err(e) => debug!("Dropping unparseable frame from {}: {}", id, e),
                },
                Some(Ok(Message::Close(_))) | None => break,
                // Binary frames ignored; ping/pong answered by axum
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("WebSocket error on {}: {}", id, e);
                    break;
                }
            },
            outgoing = events.recv() => match outgoing {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Client {} lagged, skipped {} events", id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    hub.disconnect(id).await;
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), axum::Error> {
    match event.to_frame() {
        Ok(frame) => socket.send(Message::Text(frame)).await,
        Err(e) => {
            // Unreachable for these types
            warn!("Failed to serialize {} event: {}", event.name(), e);
            Ok(())
        }
    }
}

//! WebSocket channels for the operator console and the public display
//!
//! Each connection subscribes to the broadcast hub for its scope and is
//! caught up before any later event. Incoming frames are ignored apart
//! from close/ping bookkeeping; the channels are push-only. When the
//! socket goes away, the subscription is dropped and the hub prunes the
//! handle.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::any,
    Router,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::models::Scope;

use super::AppState;

/// Create the WebSocket router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/operator", any(operator_ws))
        .route("/ws/public", any(public_ws))
        .with_state(state)
}

async fn operator_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Scope::Operator))
}

async fn public_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Scope::Public))
}

async fn handle_socket(socket: WebSocket, state: AppState, scope: Scope) {
    let mut subscription = state.engine.hub().subscribe(scope);
    let id = subscription.id;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = subscription.receiver.recv() => {
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(event.as_ref()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(%id, error = %e, "Dropping unserializable event");
                        continue;
                    }
                };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients only send keepalives; axum answers pings itself
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.engine.hub().unsubscribe(scope, id);
    debug!(%id, %scope, "WebSocket connection closed");
}

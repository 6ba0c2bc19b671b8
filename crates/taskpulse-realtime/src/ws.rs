// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket endpoint.
//!
//! Client -> Server (JSON):
//! ```json
//! {"event": "join-task", "taskId": "..."}
//! {"event": "leave-task", "taskId": "..."}
//! ```
//!
//! Server -> Client frames are [`crate::event::ServerEvent`] envelopes.
//!
//! Authentication happens during the handshake, before the upgrade: the
//! token comes from the `?token=` query parameter or the `Authorization:
//! Bearer` header, and the resolved user must still exist in the user store.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use taskpulse_core::{TokenVerifier, UserStore};

use crate::hub::SocketHub;

/// Shared state for the realtime endpoints.
#[derive(Clone)]
pub struct RealtimeState {
    pub hub: Arc<SocketHub>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub users: Arc<dyn UserStore>,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Room control message from the client.
#[derive(Debug, Deserialize)]
struct ClientMessage {
    event: String,
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

/// WebSocket upgrade handler. Rejects with 401 before upgrading when the
/// token is missing, invalid, or names a user that no longer exists.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<RealtimeState>,
) -> Result<Response, StatusCode> {
    let token = query.token.or_else(|| bearer_token(&headers));
    let Some(token) = token else {
        debug!("ws handshake without token");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = match state.verifier.verify(&token) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, "ws handshake token rejected");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // The token may outlive the account.
    match state.users.user_exists(&claims.user_id).await {
        Ok(true) => {}
        Ok(false) => {
            debug!(user_id = %claims.user_id, "ws handshake for unknown user");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            warn!(error = %e, "user lookup failed during ws handshake");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    let user_id = claims.user_id;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Drive one authenticated socket until it closes.
///
/// A sender task forwards hub fanout frames to the client; the receive loop
/// handles room control messages. Both halves end when the client closes,
/// after which the socket is deregistered from the hub.
async fn handle_socket(socket: WebSocket, state: RealtimeState, user_id: String) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let socket_id = uuid::Uuid::new_v4().to_string();

    let mut rx = state.hub.register(&socket_id, &user_id);
    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let incoming: ClientMessage = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(socket_id, "invalid client message: {e}");
                        continue;
                    }
                };
                let Some(task_id) = incoming.task_id else {
                    warn!(socket_id, event = %incoming.event, "client message without taskId");
                    continue;
                };
                match incoming.event.as_str() {
                    "join-task" => state.hub.join_task(&socket_id, &task_id),
                    "leave-task" => state.hub.leave_task(&socket_id, &task_id),
                    other => debug!(socket_id, event = other, "unknown client event ignored"),
                }
            }
            Message::Close(_) => break,
            _ => {} // Binary and ping/pong frames carry no protocol meaning.
        }
    }

    state.hub.disconnect(&socket_id);
    sender_task.abort();
}

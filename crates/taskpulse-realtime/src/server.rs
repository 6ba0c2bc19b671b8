// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime HTTP/WebSocket server built on axum.

use axum::{extract::State, routing::get, Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use taskpulse_config::ServerConfig;
use taskpulse_core::PulseError;

use crate::ws::{self, RealtimeState};

/// Realtime routes:
/// - GET /ws      WebSocket endpoint (auth during handshake)
/// - GET /health  liveness + online user count, unauthenticated
pub fn router(state: RealtimeState) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(get_health))
        .with_state(state)
}

/// Start the realtime server and serve until the token is cancelled.
pub async fn start_server(
    config: &ServerConfig,
    state: RealtimeState,
    shutdown: CancellationToken,
) -> Result<(), PulseError> {
    serve_app(config, router(state), shutdown).await
}

/// Bind and serve an app (the realtime routes, possibly merged with more)
/// until the token is cancelled.
pub async fn serve_app(
    config: &ServerConfig,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), PulseError> {
    let app = app.layer(CorsLayer::permissive());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PulseError::Realtime {
            message: format!("failed to bind realtime server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("realtime server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| PulseError::Realtime {
            message: format!("realtime server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

async fn get_health(State(state): State<RealtimeState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "online_users": state.hub.online_count(),
    }))
}

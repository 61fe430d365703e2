// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - API Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   HTTP surface of the relay: the websocket endpoints for room and private
//   chat, the message history queries, and a liveness probe. Everything is
//   wired against the shared service container via axum state.
//
// =============================================================================

pub mod history;
pub mod websocket;

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::service::Services;

/// Build the full relay router.
pub fn router(services: Arc<Services>) -> Router {
    Router::new()
        .route("/ws/:room_id", get(websocket::room_socket))
        .route("/ws/private/:other_user_id", get(websocket::private_socket))
        .route("/history/:room_id", get(history::room_history))
        .route(
            "/private_messages/:other_user_id",
            get(history::private_history),
        )
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(services)
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - WebSocket Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   WebSocket transport for chat sessions. Each accepted socket gets one
//   ChatSession driving the protocol and one registry Connection feeding
//   outbound broadcasts; this module only moves frames between the two.
//   An invalid handshake token closes the socket with a policy-violation
//   code before the session ever joins the registry.
//
// =============================================================================

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use babelon_core::types::GroupId;

use crate::service::Services;
use crate::session::ChatSession;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

enum Route {
    Room(String),
    Private(String),
}

/// `GET /ws/{room_id}?token=...` - join a shared room.
pub async fn room_socket(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<TokenQuery>,
    State(services): State<Arc<Services>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, services, Route::Room(room_id), query.token))
}

/// `GET /ws/private/{other_user_id}?token=...` - join a private pair chat.
/// Both sides resolve to the same canonical group key.
pub async fn private_socket(
    ws: WebSocketUpgrade,
    Path(other_user_id): Path<String>,
    Query(query): Query<TokenQuery>,
    State(services): State<Arc<Services>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        handle_socket(socket, services, Route::Private(other_user_id), query.token)
    })
}

async fn handle_socket(mut socket: WebSocket, services: Arc<Services>, route: Route, token: String) {
    let mut session = ChatSession::new(Arc::clone(&services));

    let user_id = match session.authenticate(&token).await {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!("🚫 Rejecting connection: {e}");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "policy violation".into(),
                })))
                .await;
            return;
        }
    };

    let group = match route {
        Route::Room(room_id) => GroupId::room(room_id),
        Route::Private(other_user_id) => GroupId::private(&user_id, &other_user_id),
    };

    let mut connection = match session.join(group.clone()).await {
        Ok(connection) => connection,
        Err(e) => {
            warn!("🚫 {user_id} could not join {group}: {e}");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AGAIN,
                    reason: "relay unavailable".into(),
                })))
                .await;
            return;
        }
    };
    info!("🔗 {user_id} connected to {group}");

    let (mut ws_tx, mut ws_rx) = socket.split();
    loop {
        tokio::select! {
            // Broadcasts fanned in from the registry.
            outbound = connection.recv() => match outbound {
                Some(payload) => {
                    if ws_tx.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                // Registry dropped us: leave or relay teardown.
                None => break,
            },
            // Frames from the client.
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(raw))) => {
                    if let Err(e) = session.process_message(&raw).await {
                        warn!("🚫 Closing {user_id} on protocol error: {e}");
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {} // ping/pong/binary: nothing to relay
                Some(Err(e)) => {
                    debug!("Transport error for {user_id}: {e}");
                    break;
                }
            },
        }
    }

    session.disconnect(&connection).await;
}

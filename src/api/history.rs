// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - History Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Read-side endpoints over the message sink: room history and private
//   conversation history, ordered by timestamp. These are thin queries on
//   the persistence collaborator; the relay core never reads them back.
//
// =============================================================================

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use babelon_core::types::{GroupId, StoredMessage};

use crate::service::Services;

use super::websocket::TokenQuery;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<StoredMessage>,
}

/// `GET /history/{room_id}` - full history of a shared room.
pub async fn room_history(
    Path(room_id): Path<String>,
    State(services): State<Arc<Services>>,
) -> Result<Json<HistoryResponse>, StatusCode> {
    let group = GroupId::room(room_id);
    let messages = services.sink.history(&group).await.map_err(|e| {
        error!("❌ History query for {group} failed: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(HistoryResponse { messages }))
}

/// `GET /private_messages/{other_user_id}?token=...` - private conversation
/// between the authenticated caller and `other_user_id`, both directions.
pub async fn private_history(
    Path(other_user_id): Path<String>,
    Query(query): Query<TokenQuery>,
    State(services): State<Arc<Services>>,
) -> Result<Json<HistoryResponse>, StatusCode> {
    let user_id = services
        .auth
        .verify(&query.token)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let group = GroupId::private(&user_id, &other_user_id);
    let messages = services.sink.history(&group).await.map_err(|e| {
        error!("❌ History query for {group} failed: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(HistoryResponse { messages }))
}

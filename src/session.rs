// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Chat Session Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Per-connection control loop state machine:
//     Connecting -> Authenticated -> Joined -> Active -> Closed
//   Authentication failure closes before registration. Each inbound
//   message is parsed with degrade-to-default semantics, dispatched for
//   translation, persisted once in its original form, and broadcast per
//   distinct target language. Disconnect removes the connection from the
//   registry and announces the departure to the remaining members.
//
// =============================================================================

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use babelon_common::{BabelonError, Result};
use babelon_core::traits::MessageSink;
use babelon_core::types::{GroupId, MessageEnvelope};
use babelon_rooms::Connection;

use crate::service::Services;

/// Lifecycle of one chat session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticated,
    Joined,
    Active,
    Closed,
}

/// One authenticated chat session over a live duplex channel.
///
/// The transport owns the socket and the [`Connection`] handle; the session
/// owns the protocol: state transitions, message processing and the
/// departure announcement.
pub struct ChatSession {
    services: Arc<Services>,
    state: SessionState,
    user_id: Option<String>,
    group: Option<GroupId>,
}

impl ChatSession {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            state: SessionState::Connecting,
            user_id: None,
            group: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Authenticated user id, once past the handshake.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Verify the handshake token. On failure the session is closed before
    /// it ever joins the registry; the caller must refuse the transport with
    /// a policy-violation close.
    #[instrument(level = "debug", skip(self, token))]
    pub async fn authenticate(&mut self, token: &str) -> Result<String> {
        match self.services.auth.verify(token).await {
            Ok(user_id) => {
                debug!("🔑 Session authenticated as {user_id}");
                self.user_id = Some(user_id.clone());
                self.state = SessionState::Authenticated;
                Ok(user_id)
            }
            Err(e) => {
                self.state = SessionState::Closed;
                Err(e)
            }
        }
    }

    /// Register with the connection registry under `group`. The returned
    /// [`Connection`] is handed to the transport, which drains it into the
    /// socket.
    pub async fn join(&mut self, group: GroupId) -> Result<Connection> {
        if self.state != SessionState::Authenticated {
            return Err(BabelonError::Protocol(
                "join requires an authenticated session".to_string(),
            ));
        }
        let user_id = self
            .user_id
            .clone()
            .ok_or_else(|| BabelonError::Internal("authenticated session lost its user".to_string()))?;

        let connection = self.services.registry.join(group.clone(), user_id).await?;
        self.group = Some(group);
        self.state = SessionState::Joined;
        Ok(connection)
    }

    /// Process one inbound payload: parse, resolve targets, translate,
    /// persist the original once, and broadcast one copy per distinct
    /// target language. Returns the total number of deliveries.
    #[instrument(level = "debug", skip(self, raw))]
    pub async fn process_message(&mut self, raw: &str) -> Result<usize> {
        if !matches!(self.state, SessionState::Joined | SessionState::Active) {
            return Err(BabelonError::Protocol(
                "message received before the session joined a group".to_string(),
            ));
        }
        let user_id = self
            .user_id
            .clone()
            .ok_or_else(|| BabelonError::Internal("joined session lost its user".to_string()))?;
        let group = self
            .group
            .clone()
            .ok_or_else(|| BabelonError::Internal("joined session lost its group".to_string()))?;

        let defaults = self.services.config.envelope_defaults();
        let envelope = MessageEnvelope::parse(raw, &defaults);
        let spec = envelope.target_spec(&defaults);

        let resolved = self
            .services
            .dispatcher
            .resolve_targets(&spec, &envelope.from_language, &envelope.register)
            .await;
        let translations = self
            .services
            .dispatcher
            .translate_all(
                &envelope.content,
                &envelope.from_language,
                &resolved.languages,
                &resolved.register,
            )
            .await;

        // The original is persisted exactly once, regardless of how many
        // target languages were produced. Fire-and-forget: real-time
        // delivery never waits on the sink.
        persist(
            Arc::clone(&self.services.sink),
            user_id.clone(),
            group.clone(),
            envelope.content.clone(),
        );

        let mut delivered = 0;
        for (target_lang, translated) in &translations {
            let payload = format!("{user_id} ({target_lang}): {translated}");
            delivered += self.services.registry.broadcast(&group, &payload).await;
        }
        self.state = SessionState::Active;
        Ok(delivered)
    }

    /// Tear the session down: leave the registry, announce the departure to
    /// whoever remains, and mark the session closed. Idempotent.
    pub async fn disconnect(&mut self, connection: &Connection) {
        if self.state == SessionState::Closed {
            return;
        }
        self.services.registry.leave(connection).await;
        if let (Some(user_id), Some(group)) = (&self.user_id, &self.group) {
            let notice = format!("User {user_id} left");
            self.services.registry.broadcast(group, &notice).await;
            info!("👋 {user_id} left {group}");
        }
        self.state = SessionState::Closed;
    }
}

fn persist(sink: Arc<dyn MessageSink>, sender: String, group: GroupId, content: String) {
    tokio::spawn(async move {
        let timestamp = Utc::now();
        if let Err(e) = sink.append(&sender, &group, &content, timestamp).await {
            // Persistence is best-effort auditing; the live broadcast has
            // already gone out.
            warn!("⚠️ Failed to persist message from {sender} in {group}: {e}");
        }
    });
}

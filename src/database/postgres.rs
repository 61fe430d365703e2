//! PostgreSQL persistence collaborators
//!
//! Production [`MessageSink`] and [`PreferenceStore`] over sqlx. The schema
//! is created on connect so a fresh database works out of the box; larger
//! deployments can manage it externally, the statements are idempotent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use babelon_common::{BabelonError, Result};
use babelon_core::traits::{MessageSink, PreferenceStore};
use babelon_core::types::{GroupId, LanguagePreference, StoredMessage};

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS chat_messages (\
         id         BIGSERIAL PRIMARY KEY,\
         sender     TEXT        NOT NULL,\
         group_key  TEXT        NOT NULL,\
         content    TEXT        NOT NULL,\
         sent_at    TIMESTAMPTZ NOT NULL\
     )",
    "CREATE INDEX IF NOT EXISTS chat_messages_group_idx \
         ON chat_messages (group_key, sent_at)",
];

/// sqlx-backed [`MessageSink`].
pub struct PgMessageSink {
    pool: PgPool,
}

impl PgMessageSink {
    /// Connect and ensure the message schema exists.
    #[instrument(level = "debug", skip(database_url))]
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await
            .map_err(|e| BabelonError::Database(e.to_string()))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| BabelonError::Database(e.to_string()))?;
        }
        debug!("✅ Message sink connected and schema ensured");

        Ok(Self { pool })
    }

    /// Build a sink over an existing pool (shared with the preference store).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MessageSink for PgMessageSink {
    async fn append(
        &self,
        sender: &str,
        group: &GroupId,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_messages (sender, group_key, content, sent_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(sender)
        .bind(group.key())
        .bind(content)
        .bind(timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| BabelonError::Persistence(e.to_string()))?;
        Ok(())
    }

    async fn history(&self, group: &GroupId) -> Result<Vec<StoredMessage>> {
        let rows = sqlx::query(
            "SELECT sender, group_key, content, sent_at FROM chat_messages \
             WHERE group_key = $1 ORDER BY sent_at",
        )
        .bind(group.key())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BabelonError::Persistence(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| StoredMessage {
                sender: row.get("sender"),
                group: row.get("group_key"),
                content: row.get("content"),
                timestamp: row.get("sent_at"),
            })
            .collect())
    }
}

/// sqlx-backed [`PreferenceStore`] reading the external user table.
pub struct PgPreferenceStore {
    pool: PgPool,
}

impl PgPreferenceStore {
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for PgPreferenceStore {
    async fn preferences(&self, user_id: &str) -> Result<Option<LanguagePreference>> {
        let row = sqlx::query(
            "SELECT default_language, language_level FROM users WHERE username = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BabelonError::Preference(e.to_string()))?;

        Ok(row.map(|row| LanguagePreference {
            default_language: row.get("default_language"),
            register: row.get("language_level"),
        }))
    }
}

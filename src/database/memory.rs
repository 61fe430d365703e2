//! In-memory persistence collaborators
//!
//! Used by the test suite and by development deployments that run without
//! PostgreSQL. Semantics mirror the database-backed variants: appends are
//! tagged with sender, group and timestamp; history is ordered by timestamp.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use babelon_common::Result;
use babelon_core::traits::{MessageSink, PreferenceStore};
use babelon_core::types::{GroupId, LanguagePreference, StoredMessage};

/// Vec-backed [`MessageSink`].
#[derive(Debug, Default)]
pub struct MemoryMessageSink {
    messages: RwLock<Vec<StoredMessage>>,
}

impl MemoryMessageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of appended messages, across all groups.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageSink for MemoryMessageSink {
    async fn append(
        &self,
        sender: &str,
        group: &GroupId,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.messages.write().await.push(StoredMessage {
            sender: sender.to_string(),
            group: group.key(),
            content: content.to_string(),
            timestamp,
        });
        Ok(())
    }

    async fn history(&self, group: &GroupId) -> Result<Vec<StoredMessage>> {
        let key = group.key();
        let mut messages: Vec<StoredMessage> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|message| message.group == key)
            .cloned()
            .collect();
        messages.sort_by_key(|message| message.timestamp);
        Ok(messages)
    }
}

/// HashMap-backed [`PreferenceStore`].
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    preferences: RwLock<HashMap<String, LanguagePreference>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: impl Into<String>, preference: LanguagePreference) {
        self.preferences
            .write()
            .await
            .insert(user_id.into(), preference);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn preferences(&self, user_id: &str) -> Result<Option<LanguagePreference>> {
        Ok(self.preferences.read().await.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_history_is_scoped_to_the_group_and_ordered() {
        let sink = MemoryMessageSink::new();
        let r1 = GroupId::room("r1");
        let r2 = GroupId::room("r2");

        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::seconds(1);
        sink.append("bob", &r1, "second", t1).await.unwrap();
        sink.append("alice", &r1, "first", t0).await.unwrap();
        sink.append("carol", &r2, "elsewhere", t0).await.unwrap();

        let history = sink.history(&r1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
    }

    #[test_log::test(tokio::test)]
    async fn test_private_history_is_pair_symmetric() {
        let sink = MemoryMessageSink::new();
        sink.append("alice", &GroupId::private("alice", "bob"), "hi", Utc::now())
            .await
            .unwrap();

        let history = sink
            .history(&GroupId::private("bob", "alice"))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].sender, "alice");
    }

    #[test_log::test(tokio::test)]
    async fn test_preference_store_round_trip() {
        let store = MemoryPreferenceStore::new();
        store
            .insert(
                "alice",
                LanguagePreference {
                    default_language: "es".to_string(),
                    register: "courant".to_string(),
                },
            )
            .await;

        assert_eq!(
            store.preferences("alice").await.unwrap().unwrap().default_language,
            "es"
        );
        assert!(store.preferences("nobody").await.unwrap().is_none());
    }
}

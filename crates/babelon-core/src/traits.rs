//! Collaborator contracts for Babelon
//!
//! The relay core treats every external system as an injected trait object:
//! credential verification, the user preference store, the message history
//! sink, the translation model and the key-value cache. Production wires
//! real implementations in at startup; tests substitute stubs or mocks.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{GroupId, LanguagePreference, StoredMessage};
use babelon_common::Result;

/// Credential verification, used once at connection handshake.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify a token and return the authenticated user id.
    async fn verify(&self, token: &str) -> Result<String>;
}

/// Read-only access to stored user language preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Fetch the language preference for a user, `None` when unknown.
    async fn preferences(&self, user_id: &str) -> Result<Option<LanguagePreference>>;
}

/// Append-only persistence of original (untranslated) messages.
///
/// Appends are best-effort auditing: a failure is logged by the caller and
/// never blocks live delivery.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Record one message against its group, tagged with sender and time.
    async fn append(
        &self,
        sender: &str,
        group: &GroupId,
        content: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()>;

    /// All messages recorded for a group, ordered by timestamp.
    async fn history(&self, group: &GroupId) -> Result<Vec<StoredMessage>>;
}

/// The translation model. Synchronous and potentially slow; only ever
/// invoked from the bounded worker pool, never on a connection task.
pub trait TranslationBackend: Send + Sync {
    /// Translate `text` from `source_lang` into `target_lang`.
    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// Key-value store with per-entry TTL backing the translation cache.
///
/// `get`/`set` are assumed atomic; concurrent writers for the same key
/// produce the same value, so last-write-wins is safe.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        Preferences {}
        #[async_trait]
        impl PreferenceStore for Preferences {
            async fn preferences(&self, user_id: &str) -> Result<Option<LanguagePreference>>;
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_preference_store_contract() {
        let mut mock = MockPreferences::new();
        mock.expect_preferences()
            .with(eq("alice"))
            .times(1)
            .returning(|_| {
                Ok(Some(LanguagePreference {
                    default_language: "es".to_string(),
                    register: "courant".to_string(),
                }))
            });

        let pref = mock.preferences("alice").await.unwrap().unwrap();
        assert_eq!(pref.default_language, "es");
    }
}

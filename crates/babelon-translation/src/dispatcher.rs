//! Translation dispatcher
//!
//! Sits between the session handlers and the translation model. Resolves
//! the target language set (explicit list or recipient preference), consults
//! the cache, and hands misses to the worker pool. Per-target failures
//! degrade to passing the source text through: one broken language never
//! drops the message for the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

use babelon_common::{BabelonError, Result};
use babelon_core::traits::{CacheStore, PreferenceStore, TranslationBackend};
use babelon_core::types::TargetSpec;

use crate::cache::TranslationCache;
use crate::pool::WorkerPool;

/// Target languages and register for one message, after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTargets {
    pub languages: Vec<String>,
    pub register: String,
}

/// Dispatches translation work for every session handler.
///
/// Constructed once at startup and shared by reference; owns the worker
/// pool and the memoization layer.
pub struct TranslationDispatcher {
    pool: Arc<WorkerPool>,
    cache: TranslationCache,
    preferences: Arc<dyn PreferenceStore>,
}

impl TranslationDispatcher {
    pub fn new(
        backend: Arc<dyn TranslationBackend>,
        cache_store: Arc<dyn CacheStore>,
        preferences: Arc<dyn PreferenceStore>,
        workers: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            pool: Arc::new(WorkerPool::new(workers, backend)),
            cache: TranslationCache::new(cache_store, cache_ttl),
            preferences,
        }
    }

    /// Resolve the target language set for a message.
    ///
    /// An explicit language list passes through unchanged with the stated
    /// register. A recipient id is looked up in the preference store; a
    /// recipient without a resolvable preference degrades to the source
    /// language (passthrough), never an error.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve_targets(
        &self,
        spec: &TargetSpec,
        source_lang: &str,
        register: &str,
    ) -> ResolvedTargets {
        match spec {
            TargetSpec::Languages(languages) => {
                let mut unique = Vec::with_capacity(languages.len());
                for language in languages {
                    if !unique.contains(language) {
                        unique.push(language.clone());
                    }
                }
                if unique.is_empty() {
                    unique.push(source_lang.to_string());
                }
                ResolvedTargets {
                    languages: unique,
                    register: register.to_string(),
                }
            }
            TargetSpec::Recipient(user_id) => match self.preferences.preferences(user_id).await {
                Ok(Some(preference)) => ResolvedTargets {
                    languages: vec![preference.default_language],
                    register: preference.register,
                },
                Ok(None) => {
                    debug!("No stored preference for {user_id}, passing source language through");
                    ResolvedTargets {
                        languages: vec![source_lang.to_string()],
                        register: register.to_string(),
                    }
                }
                Err(e) => {
                    warn!("⚠️ Preference lookup for {user_id} failed, degrading to passthrough: {e}");
                    ResolvedTargets {
                        languages: vec![source_lang.to_string()],
                        register: register.to_string(),
                    }
                }
            },
        }
    }

    /// Translate `text` into every target language.
    ///
    /// Cache first, worker pool on a miss, source text passthrough when the
    /// target equals the source or the model fails for that one target.
    /// Always returns an entry per distinct target language.
    #[instrument(level = "debug", skip(self, text))]
    pub async fn translate_all(
        &self,
        text: &str,
        source_lang: &str,
        targets: &[String],
        register: &str,
    ) -> HashMap<String, String> {
        let mut translations = HashMap::with_capacity(targets.len());
        for target_lang in targets {
            if translations.contains_key(target_lang) {
                continue;
            }
            if target_lang == source_lang {
                // Passthrough: a model round trip for the source language is
                // wasted inference.
                translations.insert(target_lang.clone(), text.to_string());
                continue;
            }

            if let Some(hit) = self
                .cache
                .lookup(text, source_lang, target_lang, register)
                .await
            {
                translations.insert(target_lang.clone(), hit);
                continue;
            }

            match self.dispatch(text, source_lang, target_lang, register).await {
                Ok(translated) => {
                    translations.insert(target_lang.clone(), translated);
                }
                Err(e) => {
                    warn!(
                        "⚠️ Translation {source_lang}->{target_lang} failed, passing source text through: {e}"
                    );
                    translations.insert(target_lang.clone(), text.to_string());
                }
            }
        }
        translations
    }

    /// Shut the worker pool down; in-flight jobs complete first.
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    /// Submit one translation and await it through a detached completion
    /// task. The detachment matters for cancellation: if the awaiting
    /// session disconnects mid-flight, the spawned task still runs to
    /// completion and its cache write still lands for future requesters.
    async fn dispatch(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        register: &str,
    ) -> Result<String> {
        let (done, completion) = oneshot::channel();
        let pool = Arc::clone(&self.pool);
        let cache = self.cache.clone();
        let text = text.to_string();
        let source_lang = source_lang.to_string();
        let target_lang = target_lang.to_string();
        let register = register.to_string();

        tokio::spawn(async move {
            let result = pool.submit(&text, &source_lang, &target_lang).await;
            if let Ok(translated) = &result {
                cache
                    .store(&text, &source_lang, &target_lang, &register, translated.clone())
                    .await;
            }
            let _ = done.send(result);
        });

        completion
            .await
            .map_err(|_| BabelonError::Internal("translation task dropped".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{cache_key, InMemoryCacheStore};
    use async_trait::async_trait;
    use babelon_core::types::LanguagePreference;
    use mockall::mock;
    use mockall::predicate::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Preferences {}
        #[async_trait]
        impl PreferenceStore for Preferences {
            async fn preferences(&self, user_id: &str) -> Result<Option<LanguagePreference>>;
        }
    }

    /// Stub model: knows "bonjour"->"hello" for en, fails for "de".
    struct StubBackend {
        calls: AtomicUsize,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TranslationBackend for StubBackend {
        fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match target {
                "de" => Err(BabelonError::Translation("unsupported language".to_string())),
                "en" if text == "bonjour" => Ok("hello".to_string()),
                _ => Ok(format!("{target}:{text}")),
            }
        }
    }

    fn dispatcher_with(
        backend: Arc<StubBackend>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> TranslationDispatcher {
        TranslationDispatcher::new(
            backend,
            Arc::new(InMemoryCacheStore::new(64)),
            preferences,
            2,
            Duration::from_secs(60),
        )
    }

    fn no_preferences() -> Arc<dyn PreferenceStore> {
        let mut mock = MockPreferences::new();
        mock.expect_preferences().returning(|_| Ok(None));
        Arc::new(mock)
    }

    #[test_log::test(tokio::test)]
    async fn test_explicit_languages_pass_through_resolution() {
        let dispatcher = dispatcher_with(Arc::new(StubBackend::new()), no_preferences());
        let spec = TargetSpec::Languages(vec!["en".to_string(), "es".to_string(), "en".to_string()]);

        let resolved = dispatcher.resolve_targets(&spec, "fr", "courant").await;
        assert_eq!(resolved.languages, vec!["en", "es"]);
        assert_eq!(resolved.register, "courant");
    }

    #[test_log::test(tokio::test)]
    async fn test_recipient_resolves_through_preference_store() {
        let mut mock = MockPreferences::new();
        mock.expect_preferences()
            .with(eq("bob"))
            .times(1)
            .returning(|_| {
                Ok(Some(LanguagePreference {
                    default_language: "es".to_string(),
                    register: "soutenu".to_string(),
                }))
            });
        let dispatcher = dispatcher_with(Arc::new(StubBackend::new()), Arc::new(mock));

        let resolved = dispatcher
            .resolve_targets(&TargetSpec::Recipient("bob".to_string()), "fr", "courant")
            .await;
        assert_eq!(resolved.languages, vec!["es"]);
        assert_eq!(resolved.register, "soutenu");
    }

    #[test_log::test(tokio::test)]
    async fn test_unknown_recipient_degrades_to_source_language() {
        let dispatcher = dispatcher_with(Arc::new(StubBackend::new()), no_preferences());

        let resolved = dispatcher
            .resolve_targets(&TargetSpec::Recipient("ghost".to_string()), "fr", "courant")
            .await;
        assert_eq!(resolved.languages, vec!["fr"]);
    }

    #[test_log::test(tokio::test)]
    async fn test_second_identical_request_is_a_cache_hit() {
        let backend = Arc::new(StubBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend), no_preferences());
        let targets = vec!["en".to_string()];

        let first = dispatcher.translate_all("bonjour", "fr", &targets, "courant").await;
        assert_eq!(first.get("en").map(String::as_str), Some("hello"));

        let second = dispatcher.translate_all("bonjour", "fr", &targets, "courant").await;
        assert_eq!(second.get("en").map(String::as_str), Some("hello"));

        // The model ran at most once for the pair.
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        dispatcher.shutdown();
    }

    #[test_log::test(tokio::test)]
    async fn test_source_language_target_skips_the_model() {
        let backend = Arc::new(StubBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend), no_preferences());

        let out = dispatcher
            .translate_all("bonjour", "fr", &["fr".to_string()], "courant")
            .await;
        assert_eq!(out.get("fr").map(String::as_str), Some("bonjour"));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_partial_failure_degrades_only_the_failing_target() {
        let backend = Arc::new(StubBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend), no_preferences());
        let targets = vec!["en".to_string(), "de".to_string(), "es".to_string()];

        let out = dispatcher.translate_all("bonjour", "fr", &targets, "courant").await;
        assert_eq!(out.len(), 3);
        assert_eq!(out.get("en").map(String::as_str), Some("hello"));
        // The failing target carries the original source text.
        assert_eq!(out.get("de").map(String::as_str), Some("bonjour"));
        assert_eq!(out.get("es").map(String::as_str), Some("es:bonjour"));
        dispatcher.shutdown();
    }

    /// Slow model standing in for real inference latency.
    struct SlowBackend;

    impl TranslationBackend for SlowBackend {
        fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
            std::thread::sleep(Duration::from_millis(50));
            Ok(format!("{target}:{text}"))
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_disconnected_requester_still_populates_the_cache() {
        let store = Arc::new(InMemoryCacheStore::new(16));
        let dispatcher = TranslationDispatcher::new(
            Arc::new(SlowBackend),
            Arc::clone(&store) as Arc<dyn CacheStore>,
            no_preferences(),
            1,
            Duration::from_secs(60),
        );
        let targets = vec!["en".to_string()];

        // The requester goes away mid-flight, as a disconnecting session
        // would: its translate_all future is dropped while the model is
        // still working.
        tokio::select! {
            _ = dispatcher.translate_all("bonjour", "fr", &targets, "courant") => {
                panic!("translation finished before the requester went away")
            }
            _ = tokio::time::sleep(Duration::from_millis(5)) => {}
        }

        // The translation still completes and its cache write still lands.
        let key = cache_key("fr", "en", "courant", "bonjour");
        let mut hit = None;
        for _ in 0..50 {
            hit = store.get(&key).await;
            if hit.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(hit.as_deref(), Some("en:bonjour"));
        dispatcher.shutdown();
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_translations_are_not_cached() {
        let backend = Arc::new(StubBackend::new());
        let dispatcher = dispatcher_with(Arc::clone(&backend), no_preferences());
        let targets = vec!["de".to_string()];

        dispatcher.translate_all("bonjour", "fr", &targets, "courant").await;
        dispatcher.translate_all("bonjour", "fr", &targets, "courant").await;

        // No cache entry was written for the failure, so the model was
        // retried on the second message.
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        dispatcher.shutdown();
    }
}

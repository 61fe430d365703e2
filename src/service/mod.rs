// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Service Container Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Explicitly constructed service container: one registry, one dispatcher,
//   one set of collaborators, built once at startup and shared by reference
//   across session handlers. There are no process-wide singletons; teardown
//   is an explicit shutdown call.
//
// =============================================================================

use std::sync::Arc;

use tracing::info;

use babelon_core::traits::{AuthProvider, MessageSink, PreferenceStore, TranslationBackend};
use babelon_core::Config;
use babelon_rooms::ConnectionRegistry;
use babelon_translation::{InMemoryCacheStore, TranslationDispatcher};

/// Shared state of the relay. Constructed once, torn down once.
pub struct Services {
    pub config: Config,
    pub registry: Arc<ConnectionRegistry>,
    pub dispatcher: Arc<TranslationDispatcher>,
    pub sink: Arc<dyn MessageSink>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Services {
    /// Wire the relay together from its collaborators.
    pub fn build(
        config: Config,
        backend: Arc<dyn TranslationBackend>,
        sink: Arc<dyn MessageSink>,
        auth: Arc<dyn AuthProvider>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Arc<Self> {
        let cache_store = Arc::new(InMemoryCacheStore::new(config.cache_capacity));
        let dispatcher = Arc::new(TranslationDispatcher::new(
            backend,
            cache_store,
            preferences,
            config.translation_workers,
            config.cache_ttl(),
        ));
        info!(
            "🔧 Services wired: {} translation worker(s), cache ttl {}s",
            config.translation_workers, config.cache_ttl_secs
        );

        Arc::new(Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            dispatcher,
            sink,
            auth,
        })
    }

    /// Tear the relay down: close the registry so transports drain out,
    /// then stop the worker pool (in-flight translations complete first).
    pub async fn shutdown(&self) {
        self.registry.close().await;
        self.dispatcher.shutdown();
        info!("🛑 Services shut down");
    }
}

// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Translation Library
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Translation dispatch for the relay: resolves target languages from an
//   explicit list or a recipient's stored preference, memoizes results in a
//   content-addressed TTL cache, and offloads the blocking model call onto
//   a bounded worker pool so it never stalls a connection task. The model
//   itself is an injected collaborator; this crate owns everything between
//   the session handler and that model.
//
// =============================================================================

pub mod cache;
pub mod dispatcher;
pub mod pool;

pub use cache::{cache_key, InMemoryCacheStore, TranslationCache};
pub use dispatcher::{ResolvedTargets, TranslationDispatcher};
pub use pool::WorkerPool;

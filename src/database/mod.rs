// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Database Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Implementations of the MessageSink and PreferenceStore collaborators.
//   PostgreSQL backs production deployments; the in-memory variants serve
//   development without a database and the test suite. The relay treats
//   both as opaque trait objects, so the choice is made once at startup.
//
// =============================================================================

pub mod memory;
pub mod postgres;

pub use memory::{MemoryMessageSink, MemoryPreferenceStore};
pub use postgres::{PgMessageSink, PgPreferenceStore};

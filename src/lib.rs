// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Library Crate
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Server crate for the Babelon relay: per-connection session handling,
//   websocket and history endpoints, JWT credential verification, the
//   persistence collaborators, and the service container that wires the
//   connection registry and translation dispatcher together.
//
// =============================================================================

pub mod api;
pub mod auth;
pub mod backend;
pub mod database;
pub mod service;
pub mod session;

// Re-export workspace crates
pub use babelon_common as common;
pub use babelon_core as core;
pub use babelon_rooms as rooms;
pub use babelon_translation as translation;

pub use babelon_common::{BabelonError, Result};

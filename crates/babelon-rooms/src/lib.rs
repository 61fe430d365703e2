// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Connection Registry Library
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Tracks live duplex channels grouped by room id or private-pair key and
//   fans payloads out to every member of a group. Membership mutation and
//   broadcast iteration are serialized through a single registry lock so
//   concurrent join/leave/broadcast calls always observe a consistent set.
//
// =============================================================================

pub mod registry;

pub use registry::{Connection, ConnectionRegistry};

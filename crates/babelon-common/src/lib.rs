// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Common Library
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Shared error taxonomy and result alias used by every Babelon crate.
//   Each recovery policy (fatal-to-connection, degrade-to-passthrough,
//   log-and-continue) maps to one variant here, so call sites never
//   invent ad hoc error strings.
//
// =============================================================================

pub mod error;

pub use error::{BabelonError, Result};

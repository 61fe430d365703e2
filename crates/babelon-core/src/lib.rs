//! Core types and traits for Babelon
//!
//! This crate defines the vocabulary shared by the whole relay: group and
//! pair identifiers, the inbound message envelope with its degrade-to-default
//! parse path, the tagged target specification, and the abstract contracts
//! for every external collaborator (auth, preferences, persistence,
//! translation backend, cache store).
//!
//! Everything here is transport-agnostic. The websocket layer and the
//! translation machinery both build on these types without depending on
//! each other.

pub mod config;
pub mod traits;
pub mod types;

pub use babelon_common::{BabelonError, Result};
pub use config::Config;
pub use types::{
    EnvelopeDefaults, GroupId, LanguagePreference, MessageEnvelope, PairKey, StoredMessage,
    TargetSpec,
};

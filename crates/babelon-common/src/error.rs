//! Error types for Babelon
//!
//! This module defines the error types used throughout the Babelon relay.
//! Variants follow the recovery taxonomy of the system: authentication
//! failures are fatal to a single connection, translation and persistence
//! failures are recovered locally, and registry/pool teardown errors are
//! only observable by late callers.

use std::io;
use thiserror::Error;

/// Babelon error types
#[derive(Debug, Error)]
pub enum BabelonError {
    /// Authentication error - fatal to the offending connection only
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Translation backend error - recovered by passing the source text through
    #[error("Translation error: {0}")]
    Translation(String),

    /// Persistence error - logged and never allowed to block live delivery
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Preference lookup error - recovered by falling back to the source language
    #[error("Preference lookup error: {0}")]
    Preference(String),

    /// The connection registry has been torn down
    #[error("Connection registry is closed")]
    RegistryClosed,

    /// The translation worker pool has been shut down
    #[error("Translation worker pool is closed")]
    PoolClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol violation on an established session
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BabelonError {
    /// Whether this error must terminate the session it occurred on.
    ///
    /// Translation, persistence and preference failures degrade locally
    /// and keep the session alive; everything else closes it.
    pub fn is_fatal_to_session(&self) -> bool {
        !matches!(
            self,
            BabelonError::Translation(_)
                | BabelonError::Persistence(_)
                | BabelonError::Preference(_)
        )
    }
}

/// Result type for Babelon operations
pub type Result<T> = std::result::Result<T, BabelonError>;

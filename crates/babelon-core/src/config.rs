//! Configuration for the Babelon relay
//!
//! Loaded once at startup from an optional TOML file merged with
//! `BABELON_`-prefixed environment variables, then validated. The resulting
//! [`Config`] is owned by the service container and shared by reference;
//! nothing in the relay reads configuration from process globals.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::EnvelopeDefaults;
use babelon_common::{BabelonError, Result};

/// Relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen address
    #[serde(default = "default_address")]
    pub address: IpAddr,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HMAC secret for verifying connection tokens
    pub jwt_secret: String,

    /// PostgreSQL URL for the message sink; in-memory sink when absent
    #[serde(default)]
    pub database_url: Option<String>,

    /// Endpoint of the external translation inference service; identity
    /// passthrough when absent
    #[serde(default)]
    pub translation_endpoint: Option<String>,

    /// Fixed size of the translation worker pool
    #[serde(default = "default_translation_workers")]
    pub translation_workers: usize,

    /// Translation cache entry lifetime, in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached translations held in memory
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Source language assumed for payloads that do not state one
    #[serde(default = "default_from_language")]
    pub default_from_language: String,

    /// Target language used when a payload names no target
    #[serde(default = "default_to_language")]
    pub default_to_language: String,

    /// Language register assumed when a payload does not state one
    #[serde(default = "default_register")]
    pub default_register: String,

    /// Tracing filter directive
    #[serde(default = "default_log")]
    pub log: String,
}

fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8448
}

fn default_translation_workers() -> usize {
    4
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_capacity() -> usize {
    4096
}

fn default_from_language() -> String {
    "fr".to_string()
}

fn default_to_language() -> String {
    "en".to_string()
}

fn default_register() -> String {
    "courant".to_string()
}

fn default_log() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from an optional TOML file plus `BABELON_*`
    /// environment variables, environment taking precedence.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            debug!("🔧 Loading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed("BABELON_"))
            .extract()
            .map_err(|e| BabelonError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that figment cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            return Err(BabelonError::Config(
                "jwt_secret must not be empty".to_string(),
            ));
        }
        if self.translation_workers == 0 {
            return Err(BabelonError::Config(
                "translation_workers must be at least 1".to_string(),
            ));
        }
        if self.cache_capacity == 0 {
            return Err(BabelonError::Config(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Socket address to bind the listener on.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address, self.port)
    }

    /// Translation cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Envelope fallback values for the session handlers.
    pub fn envelope_defaults(&self) -> EnvelopeDefaults {
        EnvelopeDefaults {
            from_language: self.default_from_language.clone(),
            to_language: self.default_to_language.clone(),
            register: self.default_register.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            jwt_secret: "babelon-dev-secret".to_string(),
            database_url: None,
            translation_endpoint: None,
            translation_workers: default_translation_workers(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            default_from_language: default_from_language(),
            default_to_language: default_to_language(),
            default_register: default_register(),
            log: default_log(),
        }
    }
}

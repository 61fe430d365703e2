// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Translation Backend Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   Production implementations of the TranslationBackend collaborator. The
//   model runs in an external inference service reached over HTTP; both
//   clients here are blocking by design because they execute exclusively on
//   the translation worker pool, never on a connection task.
//
// =============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use babelon_common::{BabelonError, Result};
use babelon_core::traits::TranslationBackend;

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

/// [`TranslationBackend`] that posts to an external inference endpoint.
pub struct HttpTranslationBackend {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpTranslationBackend {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            // The model is slow by contract; the generous timeout only
            // guards against a wedged connection, not slow inference.
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| BabelonError::Translation(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

impl TranslationBackend for HttpTranslationBackend {
    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&TranslateRequest {
                text,
                source_lang,
                target_lang,
            })
            .send()
            .map_err(|e| BabelonError::Translation(e.to_string()))?
            .error_for_status()
            .map_err(|e| BabelonError::Translation(e.to_string()))?;

        let body: TranslateResponse = response
            .json()
            .map_err(|e| BabelonError::Translation(e.to_string()))?;
        Ok(body.translated_text)
    }
}

/// Backend that returns the source text unchanged. Used when no inference
/// endpoint is configured, which turns the relay into a plain (untranslated)
/// fan-out without changing any other behavior.
pub struct IdentityBackend;

impl IdentityBackend {
    pub fn announced() -> Self {
        warn!("⚠️ No translation endpoint configured; messages will be relayed untranslated");
        Self
    }
}

impl TranslationBackend for IdentityBackend {
    fn translate(&self, text: &str, _source_lang: &str, _target_lang: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_backend_passes_text_through() {
        let backend = IdentityBackend;
        assert_eq!(backend.translate("bonjour", "fr", "en").unwrap(), "bonjour");
    }

    #[test]
    fn test_http_backend_rejects_unreachable_endpoint() {
        // Port 9 (discard) is not listening; the call must surface a
        // Translation error, which the dispatcher degrades to passthrough.
        let backend = HttpTranslationBackend::new("http://127.0.0.1:9/translate").unwrap();
        assert!(matches!(
            backend.translate("x", "fr", "en"),
            Err(BabelonError::Translation(_))
        ));
    }
}

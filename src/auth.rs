// =============================================================================
// Babelon Real-Time Multilingual Chat Relay - Auth Module
// =============================================================================
//
// Project: Babelon - Real-time multilingual chat relay with translation fan-out
// Author: Babelon Development Team
// Date: 2025-08-18
// Version: 0.3.0-alpha
// License: Apache 2.0 / MIT
//
// Description:
//   JWT verification of connection tokens. Credential issuance lives in the
//   external identity service; the relay only verifies the HMAC-signed
//   token presented at handshake and extracts the user id from its subject
//   claim. A verification failure is fatal to that connection alone.
//
// =============================================================================

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use babelon_common::{BabelonError, Result};
use babelon_core::traits::AuthProvider;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// [`AuthProvider`] backed by HS256 JWT verification.
pub struct JwtAuth {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl AuthProvider for JwtAuth {
    async fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| BabelonError::Auth(e.to_string()))?;
        if data.claims.sub.is_empty() {
            return Err(BabelonError::Auth("token has no subject".to_string()));
        }
        Ok(data.claims.sub)
    }
}

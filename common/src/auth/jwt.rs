//! HMAC (HS256) JWT validation.
//!
//! # Security
//!
//! - Tokens larger than [`MAX_TOKEN_SIZE_BYTES`] are rejected before parsing
//! - Only HS256 is accepted; the `alg` header cannot downgrade verification
//! - `exp` is required and checked with a configurable leeway
//! - Failures are logged without token contents

use std::fmt;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::middleware::auth::TokenValidator;

/// Upper bound on the size of a token we are willing to decode.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

/// Claims carried by gateway access tokens.
///
/// The gate does not consume any of these; they are decoded only so that
/// signature and expiry can be verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

/// Validator for HS256-signed JWTs sharing a secret with the token issuer.
#[derive(Clone)]
pub struct JwtTokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtTokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        f.debug_struct("JwtTokenValidator")
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl JwtTokenValidator {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = leeway_seconds;
        // Audience is not part of the gateway contract
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.leeway_seconds)
    }

    /// Verify signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

#[async_trait]
impl TokenValidator for JwtTokenValidator {
    async fn validate(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!(error = %err, "token verification failed");
                false
            }
        }
    }
}

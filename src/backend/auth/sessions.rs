/**
 * Session Tokens
 *
 * This module issues and verifies the signed bearer tokens that identify a
 * user on every protected request. A token carries the user id, username,
 * account tier and an expiry; anything that fails signature or expiry
 * checks is rejected as `InvalidAuthToken`.
 */

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::backend::error::BackendError;
use crate::backend::server::config::{ConfigError, ServerConfig};
use crate::shared::AccountTier;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub username: String,
    /// Account tier at issue time
    pub tier: AccountTier,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<Uuid, BackendError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| BackendError::invalid_token("subject is not a user id"))
    }
}

/// Signs and verifies session tokens
///
/// Built once from `ServerConfig` and shared through `AppState`.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    ttl: chrono::Duration,
}

impl SessionCodec {
    pub fn new(secret: &str, algorithm: Algorithm, ttl: chrono::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.jwt_secret(), config.algorithm()?, config.token_ttl()))
    }

    /// Create a token for a user
    ///
    /// # Arguments
    /// * `user` - The authenticated user
    ///
    /// # Returns
    /// Signed token string
    pub fn issue(&self, user: &User) -> Result<String, BackendError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            tier: user.account_tier,
            exp: now + self.ttl.num_seconds(),
            iat: now,
        };
        Ok(encode(&Header::new(self.algorithm), &claims, &self.encoding_key)?)
    }

    /// Verify and decode a token
    ///
    /// Expiry is checked with zero leeway.
    ///
    /// # Errors
    /// `InvalidAuthToken` for bad signatures, malformed tokens and expired tokens
    pub fn verify(&self, token: &str) -> Result<Claims, BackendError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("Rejected session token: {}", e);
                BackendError::invalid_token(e.to_string())
            })
    }

    /// Sign arbitrary claims; used to mint expired tokens in tests
    #[cfg(test)]
    pub(crate) fn sign(&self, claims: &Claims) -> String {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key).unwrap()
    }
}

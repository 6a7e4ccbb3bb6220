/**
 * Session Tokens
 *
 * This module handles JWT token generation and validation. A token is
 * presented once per socket connection (or once per REST request) and
 * resolves to a user identity.
 */

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::BackendError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Username at issuance time
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
}

/// Identity resolved from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub username: String,
}

/// HS256 token issuer and verifier
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl JwtAuth {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Create a JWT token for a user
    pub fn create_token(&self, user_id: Uuid, username: &str) -> Result<String, BackendError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| BackendError::state(format!("Failed to sign token: {e}")))
    }

    /// Verify and decode a JWT token
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, BackendError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|e| BackendError::authentication(format!("Invalid token: {e}")))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| BackendError::authentication("Invalid user ID in token"))?;

        Ok(VerifiedIdentity {
            user_id,
            username: data.claims.username,
        })
    }
}

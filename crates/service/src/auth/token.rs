use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::domain::{AccessToken, IssuedToken, User};
use super::errors::AuthError;
use super::repository::TokenStore;

/// Name stamped on every token created by register/login.
pub const DEFAULT_TOKEN_NAME: &str = "authToken";

/// Issues, resolves and revokes bearer tokens.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, user: &User) -> Result<IssuedToken, AuthError>;
    /// Resolve a presented bearer string to its live record.
    async fn authenticate(&self, raw: &str) -> Result<AccessToken, AuthError>;
    async fn revoke(&self, token: &AccessToken) -> Result<(), AuthError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    jti: String,
    name: String,
    iat: i64,
    exp: i64,
}

/// HS256 JWTs whose `jti` points at a [`TokenStore`] record.
pub struct JwtTokenIssuer {
    store: Arc<dyn TokenStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(store: Arc<dyn TokenStore>, secret: &str, ttl: Duration) -> Self {
        Self {
            store,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn decode_claims(&self, raw: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        decode::<Claims>(raw, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(err = %e, "token decode failed");
                AuthError::Unauthenticated
            })
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue(&self, user: &User) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let record = AccessToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            name: DEFAULT_TOKEN_NAME.to_string(),
            created_at: now,
            expires_at: now + self.ttl,
        };
        let claims = Claims {
            sub: user.id.to_string(),
            jti: record.id.to_string(),
            name: record.name.clone(),
            iat: record.created_at.timestamp(),
            exp: record.expires_at.timestamp(),
        };
        let plain_text = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        let pruned = self.store.prune_expired(user.id, now).await?;
        if pruned > 0 {
            debug!(user_id = %user.id, pruned, "expired tokens removed");
        }
        let record = self.store.insert(record).await?;
        Ok(IssuedToken { record, plain_text })
    }

    async fn authenticate(&self, raw: &str) -> Result<AccessToken, AuthError> {
        let claims = self.decode_claims(raw)?;
        let id = Uuid::parse_str(&claims.jti).map_err(|_| AuthError::Unauthenticated)?;
        let record = self.store.find(id).await?.ok_or(AuthError::Unauthenticated)?;
        if record.user_id.to_string() != claims.sub || record.is_expired_at(Utc::now()) {
            return Err(AuthError::Unauthenticated);
        }
        Ok(record)
    }

    async fn revoke(&self, token: &AccessToken) -> Result<(), AuthError> {
        if !self.store.delete(token.id).await? {
            debug!(token_id = %token.id, "token already revoked");
        }
        Ok(())
    }
}

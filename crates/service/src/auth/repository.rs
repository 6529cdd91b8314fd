use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::{AccessToken, NewUser, User};
use super::errors::AuthError;

/// Durable persistence and lookup of users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user; an already registered email yields [`AuthError::Conflict`].
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;
}

/// Persistence of access-token records. A token is active while its record exists.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: AccessToken) -> Result<AccessToken, AuthError>;
    async fn find(&self, id: Uuid) -> Result<Option<AccessToken>, AuthError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, AuthError>;
    /// Drop the user's records that expired at or before `now`; returns how many went.
    async fn prune_expired(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AuthError>;
}

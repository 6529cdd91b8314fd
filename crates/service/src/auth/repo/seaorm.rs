use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{AccessToken, NewUser, User};
use crate::auth::errors::AuthError;
use crate::auth::repository::{TokenStore, UserStore};

fn to_user(u: models::user::Model) -> User {
    User {
        id: u.id,
        name: u.name,
        email: u.email,
        password_hash: u.password,
        created_at: u.created_at.with_timezone(&Utc),
        updated_at: u.updated_at.with_timezone(&Utc),
    }
}

fn to_token(t: models::access_token::Model) -> AccessToken {
    AccessToken {
        id: t.id,
        user_id: t.user_id,
        name: t.name,
        created_at: t.created_at.with_timezone(&Utc),
        expires_at: t.expires_at.with_timezone(&Utc),
    }
}

pub struct SeaOrmUserStore {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl UserStore for SeaOrmUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        let created = models::user::create(&self.db, &new_user.name, &new_user.email, &new_user.password_hash).await?;
        Ok(to_user(created))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await?;
        Ok(res.map(to_user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let res = models::user::find_by_id(&self.db, id).await?;
        Ok(res.map(to_user))
    }
}

pub struct SeaOrmTokenStore {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl TokenStore for SeaOrmTokenStore {
    async fn insert(&self, token: AccessToken) -> Result<AccessToken, AuthError> {
        let created = models::access_token::create(
            &self.db,
            token.id,
            token.user_id,
            &token.name,
            token.created_at,
            token.expires_at,
        )
        .await?;
        Ok(to_token(created))
    }

    async fn find(&self, id: Uuid) -> Result<Option<AccessToken>, AuthError> {
        let res = models::access_token::find(&self.db, id).await?;
        Ok(res.map(to_token))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AuthError> {
        Ok(models::access_token::delete(&self.db, id).await?)
    }

    async fn prune_expired(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AuthError> {
        Ok(models::access_token::delete_expired_for_user(&self.db, user_id, now).await?)
    }
}

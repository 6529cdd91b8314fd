use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use crate::auth::domain::{AccessToken, NewUser, User};
use crate::auth::errors::AuthError;
use crate::auth::repository::{TokenStore, UserStore};

/// Users keyed by email; the entry API makes create-if-absent atomic.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<String, User>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn insert_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        match self.users.entry(new_user.email.clone()) {
            Entry::Occupied(_) => Err(AuthError::Conflict),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    name: new_user.name,
                    email: new_user.email,
                    password_hash: new_user.password_hash,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AuthError> {
        self.insert_user(new_user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(email).map(|u| u.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.iter().find(|u| u.value().id == id).map(|u| u.value().clone()))
    }
}

/// Token records keyed by id. Expired records are only dropped when their
/// owner is issued a new token, so a user who never returns keeps theirs
/// until restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<Uuid, AccessToken>,
}

impl MemoryTokenStore {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, token: AccessToken) -> Result<AccessToken, AuthError> {
        self.tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find(&self, id: Uuid) -> Result<Option<AccessToken>, AuthError> {
        Ok(self.tokens.get(&id).map(|t| t.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AuthError> {
        Ok(self.tokens.remove(&id).is_some())
    }

    async fn prune_expired(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let before = self.tokens.len();
        self.tokens.retain(|_, t| !(t.user_id == user_id && t.is_expired_at(now)));
        Ok(before.saturating_sub(self.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser { name: "N".into(), email: email.into(), password_hash: "h".into() }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryUserStore::default();
        let first = store.create(new_user("a@b.com")).await.unwrap();
        assert!(matches!(store.create(new_user("a@b.com")).await, Err(AuthError::Conflict)));
        assert_eq!(store.len(), 1);

        let found = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(found.email, "a@b.com");
        assert!(store.find_by_email("missing@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_registrations_single_winner() {
        let store = std::sync::Arc::new(MemoryUserStore::default());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.create(new_user("race@b.com")).await.is_ok() }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }

    fn token(user_id: Uuid, expires_in: Duration) -> AccessToken {
        let now = Utc::now();
        AccessToken {
            id: Uuid::new_v4(),
            user_id,
            name: "authToken".into(),
            created_at: now - Duration::hours(2),
            expires_at: now + expires_in,
        }
    }

    #[tokio::test]
    async fn delete_reports_whether_record_existed() {
        let store = MemoryTokenStore::default();
        let t = store.insert(token(Uuid::new_v4(), Duration::hours(1))).await.unwrap();
        assert_eq!(store.find(t.id).await.unwrap(), Some(t.clone()));

        assert!(store.delete(t.id).await.unwrap());
        assert!(!store.delete(t.id).await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn prune_drops_only_expired_records_of_that_user() {
        let store = MemoryTokenStore::default();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let live = store.insert(token(owner, Duration::hours(1))).await.unwrap();
        store.insert(token(owner, Duration::minutes(-5))).await.unwrap();
        store.insert(token(owner, Duration::minutes(-1))).await.unwrap();
        let foreign = store.insert(token(other, Duration::minutes(-5))).await.unwrap();

        assert_eq!(store.prune_expired(owner, Utc::now()).await.unwrap(), 2);
        assert_eq!(store.len(), 2);
        assert!(store.find(live.id).await.unwrap().is_some());
        assert!(store.find(foreign.id).await.unwrap().is_some());
        assert_eq!(store.prune_expired(owner, Utc::now()).await.unwrap(), 0);
    }
}

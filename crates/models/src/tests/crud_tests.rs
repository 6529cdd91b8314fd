use crate::db::{connect, migrate};
use crate::errors::ModelError;
use crate::{access_token, user};
use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::db_tests_enabled;

/// Setup test database with migrations
async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = connect().await?;
    migrate(&db).await?;
    Ok(db)
}

fn unique_email() -> String {
    format!("user_{}@example.com", Uuid::new_v4())
}

#[tokio::test]
async fn test_user_create_and_find() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;

    let email = unique_email();
    let created = user::create(&db, "Ali Ahmadi", &email, "$argon2id$v=19$stub").await?;
    assert_eq!(created.email, email);

    let by_email = user::find_by_email(&db, &email).await?.expect("user by email");
    assert_eq!(by_email.id, created.id);
    let by_id = user::find_by_id(&db, created.id).await?.expect("user by id");
    assert_eq!(by_id.name, "Ali Ahmadi");

    let json = serde_json::to_value(&by_id)?;
    assert!(json.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;

    let email = unique_email();
    user::create(&db, "First", &email, "hash-one").await?;
    let err = user::create(&db, "Second", &email, "hash-two").await.unwrap_err();
    assert!(matches!(err, ModelError::Conflict(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn test_access_token_lifecycle() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let owner = user::create(&db, "Owner", &unique_email(), "hash").await?;

    let now = Utc::now();
    let first = access_token::create(&db, Uuid::new_v4(), owner.id, "authToken", now, now + Duration::hours(1)).await?;
    let second = access_token::create(&db, Uuid::new_v4(), owner.id, "authToken", now, now + Duration::hours(1)).await?;
    assert!(access_token::find(&db, first.id).await?.is_some());

    assert!(access_token::delete(&db, first.id).await?);
    assert!(!access_token::delete(&db, first.id).await?);
    assert!(access_token::find(&db, first.id).await?.is_none());
    assert!(access_token::find(&db, second.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_delete_expired_for_user() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let owner = user::create(&db, "Owner", &unique_email(), "hash").await?;
    let other = user::create(&db, "Other", &unique_email(), "hash").await?;

    let now = Utc::now();
    let past = now - Duration::hours(2);
    let stale = access_token::create(&db, Uuid::new_v4(), owner.id, "authToken", past, now - Duration::hours(1)).await?;
    let live = access_token::create(&db, Uuid::new_v4(), owner.id, "authToken", past, now + Duration::hours(1)).await?;
    let foreign = access_token::create(&db, Uuid::new_v4(), other.id, "authToken", past, now - Duration::hours(1)).await?;

    assert_eq!(access_token::delete_expired_for_user(&db, owner.id, now).await?, 1);
    assert!(access_token::find(&db, stale.id).await?.is_none());
    assert!(access_token::find(&db, live.id).await?.is_some());
    assert!(access_token::find(&db, foreign.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_access_token_rejects_inverted_expiry() -> Result<()> {
    if !db_tests_enabled() {
        return Ok(());
    }
    let db = setup_test_db().await?;
    let now = Utc::now();
    let err = access_token::create(&db, Uuid::new_v4(), Uuid::new_v4(), "authToken", now, now)
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Validation(_)));
    Ok(())
}

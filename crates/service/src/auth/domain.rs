use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration input, as posted by the client.
///
/// Every field is optional at the type level so that a missing field is
/// reported as a validation failure instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        required(message = "The name field is required."),
        length(max = 55, message = "The name field must not be greater than 55 characters.")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(max = 255, message = "The email field must not be greater than 255 characters.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

impl RegisterInput {
    pub fn new(name: &str, email: &str, password: &str, password_confirmation: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            password_confirmation: Some(password_confirmation.to_string()),
        }
    }

    /// Trim `name`/`email` and turn empty strings into absent values.
    /// Passwords are never trimmed.
    pub fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            email: trimmed(self.email),
            password: non_empty(self.password),
            password_confirmation: non_empty(self.password_confirmation),
        }
    }
}

/// Login input
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

impl LoginInput {
    pub fn new(email: &str, password: &str) -> Self {
        Self { email: Some(email.to_string()), password: Some(password.to_string()) }
    }

    pub fn normalized(self) -> Self {
        Self { email: trimmed(self.email), password: non_empty(self.password) }
    }
}

fn trimmed(v: Option<String>) -> Option<String> {
    non_empty(v.map(|s| s.trim().to_string()))
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

/// Registration input that passed every rule.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login input that passed every rule.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Domain user. Carries the password hash, so it is deliberately not
/// `Serialize`; the HTTP layer maps it to an allow-listed resource.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for a user about to be created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Persisted record behind an issued bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A freshly issued token: the record plus the bearer string handed to the client.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: AccessToken,
    pub plain_text: String,
}

/// Result of register/login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
}

/// Request-scoped authentication context: the caller and the token it presented.
#[derive(Debug, Clone)]
pub struct AuthContext {
    user: User,
    token: AccessToken,
}

impl AuthContext {
    pub fn new(user: User, token: AccessToken) -> Self {
        Self { user, token }
    }

    pub fn current_user(&self) -> &User {
        &self.user
    }

    pub fn current_token(&self) -> &AccessToken {
        &self.token
    }
}


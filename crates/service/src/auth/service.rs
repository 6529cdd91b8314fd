use std::sync::Arc;

use chrono::Duration;
use common::metrics;
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthContext, AuthSession, LoginInput, NewUser, RegisterInput, User};
use super::errors::AuthError;
use super::hasher::{Argon2Hasher, PasswordHasher};
use super::repo::memory::{MemoryTokenStore, MemoryUserStore};
use super::repository::{TokenStore, UserStore};
use super::token::{JwtTokenIssuer, TokenIssuer};
use super::validation::{self, messages, FieldErrors};

/// Auth business service independent of web framework.
///
/// Collaborators are injected once at startup and shared across requests.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenIssuer>,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenIssuer>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, tokens, hasher }
    }

    /// Wire JWT issuance over the given stores.
    pub fn with_stores(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        hasher: Arc<dyn PasswordHasher>,
        jwt_secret: &str,
        token_ttl: Duration,
    ) -> Self {
        let issuer = Arc::new(JwtTokenIssuer::new(tokens, jwt_secret, token_ttl));
        Self::new(users, issuer, hasher)
    }

    /// Process-local stores with default Argon2 cost; state is lost on restart.
    pub fn in_memory(jwt_secret: &str, token_ttl: Duration) -> Self {
        Self::with_stores(
            Arc::new(MemoryUserStore::default()),
            Arc::new(MemoryTokenStore::default()),
            Arc::new(Argon2Hasher::default()),
            jwt_secret,
            token_ttl,
        )
    }

    /// Register a new user and issue their first token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, domain::RegisterInput};
    /// let svc = AuthService::in_memory("doc-secret-0123456789", chrono::Duration::hours(1));
    /// let input = RegisterInput::new("Ali Ahmadi", "ali@example.com", "password123", "password123");
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.email, "ali@example.com");
    /// assert!(!session.access_token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        let valid = validation::validate_registration(self.users.as_ref(), input).await?;

        let password_hash = self.hasher.hash(&valid.password)?;
        let new_user = NewUser { name: valid.name, email: valid.email, password_hash };
        let user = match self.users.create(new_user).await {
            Ok(user) => user,
            // lost a race against a concurrent registration
            Err(AuthError::Conflict) => {
                debug!("email taken at insert time");
                return Err(AuthError::Validation(FieldErrors::single("email", messages::EMAIL_TAKEN)));
            }
            Err(e) => return Err(e),
        };

        // no compensation: a failed issue leaves the user without a token
        let issued = self.tokens.issue(&user).await?;
        metrics::REGISTRATIONS_TOTAL.inc();
        info!(user_id = %user.id, token_id = %issued.record.id, algorithm = self.hasher.algorithm(), "user_registered");
        Ok(AuthSession { user, access_token: issued.plain_text })
    }

    /// Authenticate a user and issue an additional token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, domain::{RegisterInput, LoginInput}};
    /// let svc = AuthService::in_memory("doc-secret-0123456789", chrono::Duration::hours(1));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput::new("N", "u@e.com", "Passw0rd", "Passw0rd")));
    /// let session = tokio_test::block_on(svc.login(LoginInput::new("u@e.com", "Passw0rd"))).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// ```
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let creds = validation::validate_login(input)?;

        let Some(user) = self.users.find_by_email(&creds.email).await? else {
            metrics::record_login(false);
            warn!("login_failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.hasher.verify(&creds.password, &user.password_hash)? {
            metrics::record_login(false);
            warn!(user_id = %user.id, "login_failed: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&user).await?;
        metrics::record_login(true);
        info!(user_id = %user.id, token_id = %issued.record.id, "user_logged_in");
        Ok(AuthSession { user, access_token: issued.plain_text })
    }

    /// Resolve a bearer string into the request's auth context.
    pub async fn authenticate(&self, raw_token: &str) -> Result<AuthContext, AuthError> {
        let token = self.tokens.authenticate(raw_token).await?;
        let user = self
            .users
            .find_by_id(token.user_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        Ok(AuthContext::new(user, token))
    }

    /// Revoke exactly the token the request was made with.
    #[instrument(skip(self, ctx), fields(user_id = %ctx.current_user().id))]
    pub async fn logout(&self, ctx: &AuthContext) -> Result<(), AuthError> {
        self.tokens.revoke(ctx.current_token()).await?;
        metrics::LOGOUTS_TOTAL.inc();
        info!(token_id = %ctx.current_token().id, "token_revoked");
        Ok(())
    }

    pub fn profile(&self, ctx: &AuthContext) -> User {
        ctx.current_user().clone()
    }
}

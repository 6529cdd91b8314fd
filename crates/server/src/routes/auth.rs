use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use common::types::Message;
use serde::Serialize;
use uuid::Uuid;

use service::auth::{
    domain::{AuthSession, LoginInput, RegisterInput, User},
    errors::AuthError,
    AuthService,
};

use crate::auth::Authenticated;
use crate::errors::{ApiError, INVALID_CREDENTIALS};

#[derive(Clone)]
pub struct ServerAuthConfig {
    /// Status sent with `{"message": "Invalid credentials"}`.
    pub login_failure_status: StatusCode,
}

impl Default for ServerAuthConfig {
    fn default() -> Self {
        Self { login_failure_status: StatusCode::OK }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub config: ServerAuthConfig,
}

impl ServerState {
    pub fn new(auth: Arc<AuthService>, config: ServerAuthConfig) -> Self {
        Self { auth, config }
    }
}

/// Outward view of a user. Fields are allow-listed; the password hash never leaves.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResource {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResource {
    fn from(u: User) -> Self {
        Self { id: u.id, name: u.name, email: u.email, created_at: u.created_at, updated_at: u.updated_at }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub user: UserResource,
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub access_token: String,
}

impl From<AuthSession> for TokenResponse {
    fn from(s: AuthSession) -> Self {
        Self { user: s.user.into(), access_token: s.access_token }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub user: UserResource,
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = crate::openapi::RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = TokenResponse),
        (status = 400, description = "Malformed JSON body", body = crate::errors::ValidationErrorBody),
        (status = 415, description = "Body is not JSON", body = crate::errors::ValidationErrorBody),
        (status = 422, description = "Validation failed or mistyped field", body = crate::errors::ValidationErrorBody),
        (status = 500, description = "Server error")
    )
)]
pub async fn register(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, ApiError>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let session = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Logged in, or `{message}` on bad credentials when configured for 200", body = TokenResponse),
        (status = 401, description = "Invalid credentials (when configured)", body = crate::openapi::MessageDoc),
        (status = 400, description = "Malformed JSON body", body = crate::errors::ValidationErrorBody),
        (status = 422, description = "Validation failed or mistyped field", body = crate::errors::ValidationErrorBody)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<LoginInput>, ApiError>,
) -> Result<Response, ApiError> {
    match state.auth.login(input).await {
        Ok(session) => Ok((StatusCode::OK, Json(TokenResponse::from(session))).into_response()),
        Err(AuthError::InvalidCredentials) => {
            let status = state.config.login_failure_status;
            Ok((status, Json(Message::new(INVALID_CREDENTIALS))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current token revoked", body = crate::openapi::MessageDoc),
        (status = 401, description = "Unauthenticated", body = crate::openapi::MessageDoc)
    )
)]
pub async fn logout(State(state): State<ServerState>, Authenticated(ctx): Authenticated) -> Result<Json<Message>, ApiError> {
    state.auth.logout(&ctx).await?;
    Ok(Json(Message::new("Successfully logged out")))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = ProfileResponse),
        (status = 401, description = "Unauthenticated", body = crate::openapi::MessageDoc)
    )
)]
pub async fn profile(State(state): State<ServerState>, Authenticated(ctx): Authenticated) -> Json<ProfileResponse> {
    Json(ProfileResponse { user: state.auth.profile(&ctx).into() })
}

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::auth::{domain::AuthContext, errors::AuthError};

use crate::errors::ApiError;
use crate::routes::auth::ServerState;

/// Extractor that resolves `Authorization: Bearer <token>` into the
/// request-scoped [`AuthContext`]. Handlers taking it never run unauthenticated.
#[derive(Debug, Clone)]
pub struct Authenticated(pub AuthContext);

#[async_trait]
impl FromRequestParts<ServerState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_string();
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|e| {
                    tracing::debug!(path = %path, reason = %e, "missing or malformed bearer token");
                    ApiError::Auth(AuthError::Unauthenticated)
                })?;

        match state.auth.authenticate(bearer.token()).await {
            Ok(ctx) => Ok(Self(ctx)),
            Err(e) => {
                if !e.is_internal() {
                    tracing::warn!(path = %path, "token rejected");
                }
                Err(ApiError::Auth(e))
            }
        }
    }
}

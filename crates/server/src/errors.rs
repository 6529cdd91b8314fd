use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use service::auth::errors::AuthError;
use service::auth::validation::FieldErrors;
use thiserror::Error;
use tracing::{error, warn};

pub const UNAUTHENTICATED: &str = "Unauthenticated.";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INVALID_BODY: &str = "The request body is invalid.";
const SERVER_ERROR: &str = "Server Error";

/// Body of a 422 response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ValidationErrorBody {
    pub message: String,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
}

/// HTTP-facing error: a service failure or an unreadable request body.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Body(JsonRejection),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::Body(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        let err = match self {
            Self::Auth(err) => err,
            // 400 syntax, 415 content type, 422 shape
            Self::Body(rejection) => return rejection.status(),
        };
        match err {
            AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = |m: &str| Json(serde_json::json!({ "message": m }));
        let err = match self {
            Self::Auth(err) => err,
            Self::Body(rejection) => {
                warn!(status = status.as_u16(), reason = %rejection.body_text(), "request body rejected");
                let body = ValidationErrorBody {
                    message: INVALID_BODY.to_string(),
                    errors: FieldErrors::single("body", &rejection.body_text()),
                };
                return (status, Json(body)).into_response();
            }
        };
        match err {
            AuthError::Validation(errors) => {
                let body = ValidationErrorBody { message: errors.summary(), errors };
                (status, Json(body)).into_response()
            }
            AuthError::Unauthenticated => (status, message(UNAUTHENTICATED)).into_response(),
            AuthError::InvalidCredentials => (status, message(INVALID_CREDENTIALS)).into_response(),
            AuthError::Conflict => {
                warn!(code = 1002, "conflict escaped validation");
                (status, message("Conflict")).into_response()
            }
            other => {
                error!(code = other.code(), error = %other, "request failed");
                (status, message(SERVER_ERROR)).into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        let cases = [
            (AuthError::Validation(FieldErrors::single("email", "bad")), StatusCode::UNPROCESSABLE_ENTITY),
            (AuthError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::Conflict, StatusCode::CONFLICT),
            (AuthError::Repository("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::HashError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AuthError::TokenError("sign".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct MessageDoc {
    #[schema(example = "Successfully logged out")]
    pub message: String,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "Ali Ahmadi", max_length = 55)]
    pub name: String,
    #[schema(example = "ali@example.com", format = "email")]
    pub email: String,
    #[schema(example = "password123", format = "password")]
    pub password: String,
    #[schema(example = "password123", format = "password")]
    pub password_confirmation: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    #[schema(example = "ali@example.com", format = "email")]
    pub email: String,
    #[schema(example = "password123", format = "password")]
    pub password: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Account API",
        version = "1.0.0",
        description = "API documentation for authentication and user management",
        contact(email = "support@example.com")
    ),
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::profile,
    ),
    components(
        schemas(
            HealthResponse,
            MessageDoc,
            RegisterRequest,
            LoginRequest,
            crate::routes::auth::UserResource,
            crate::routes::auth::TokenResponse,
            crate::routes::auth::ProfileResponse,
            crate::errors::ValidationErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth", description = "Registration, login, logout and profile")
    )
)]
pub struct ApiDoc;

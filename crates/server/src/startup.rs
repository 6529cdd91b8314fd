use std::{net::SocketAddr, sync::Arc};

use axum::{http::StatusCode, Router};
use configs::{AppConfig, StorageBackend};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::auth::{
    hasher::Argon2Hasher,
    repo::seaorm::{SeaOrmTokenStore, SeaOrmUserStore},
    AuthService,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

fn token_ttl(cfg: &AppConfig) -> Result<chrono::Duration, StartupError> {
    let secs = i64::try_from(cfg.auth.token_ttl_secs)
        .map_err(|_| StartupError::InvalidConfig("auth.token_ttl_secs out of range".into()))?;
    Ok(chrono::Duration::seconds(secs))
}

/// Wire the collaborators for the configured storage backend.
pub async fn build_auth_service(cfg: &AppConfig) -> Result<AuthService, StartupError> {
    let ttl = token_ttl(cfg)?;
    let secret = cfg.auth.jwt_secret.as_str();
    match cfg.database.backend() {
        StorageBackend::Memory => {
            warn!("using in-memory stores; accounts and tokens are lost on restart");
            Ok(AuthService::in_memory(secret, ttl))
        }
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            if cfg.database.run_migrations {
                models::db::migrate(&db).await?;
            }
            Ok(AuthService::with_stores(
                Arc::new(SeaOrmUserStore { db: db.clone() }),
                Arc::new(SeaOrmTokenStore { db }),
                Arc::new(Argon2Hasher::default()),
                secret,
                ttl,
            ))
        }
    }
}

pub fn server_auth_config(cfg: &AppConfig) -> Result<auth::ServerAuthConfig, StartupError> {
    let status = StatusCode::from_u16(cfg.auth.login_failure_status)
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(auth::ServerAuthConfig { login_failure_status: status })
}

/// Build the app for an already validated config.
pub async fn build_app(cfg: &AppConfig) -> Result<Router, StartupError> {
    let svc = build_auth_service(cfg).await?;
    let state = auth::ServerState::new(Arc::new(svc), server_auth_config(cfg)?);
    Ok(routes::build_router(state, build_cors()))
}

/// Serve with a config the caller has already loaded and validated.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    info!(%addr, backend = ?cfg.database.backend(), "starting account api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

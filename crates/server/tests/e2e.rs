use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

struct TestApp {
    base_url: String,
}

fn config_for(url: &str) -> anyhow::Result<AppConfig> {
    let mut cfg = AppConfig::default();
    cfg.database.url = url.to_string();
    cfg.auth.jwt_secret = "e2e-test-secret-0123456789".into();
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

async fn serve(app: Router) -> anyhow::Result<TestApp> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url })
}

async fn start_memory_server() -> anyhow::Result<TestApp> {
    let cfg = config_for("memory://")?;
    let app = server::startup::build_app(&cfg).await?;
    serve(app).await
}

/// Postgres-backed app; `None` when no database is configured for tests.
async fn start_postgres_server() -> anyhow::Result<Option<TestApp>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(None); }
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL missing; skip postgres e2e tests. Provide .env.test or env var.");
        return Ok(None);
    };
    let cfg = config_for(&url)?;
    let app = server::startup::build_app(&cfg).await?;
    Ok(Some(serve(app).await?))
}

async fn full_session(app: &TestApp) -> anyhow::Result<()> {
    let c = reqwest::Client::new();
    let email = format!("user_{}@example.com", Uuid::new_v4());
    let password = "S3curePass!";

    // Register
    let res = c.post(format!("{}/api/register", app.base_url))
        .json(&json!({"name": "Tester", "email": email, "password": password, "password_confirmation": password}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["user"]["email"], email.as_str());
    let first = body["access_token"].as_str().unwrap_or_default().to_string();

    // Duplicate
    let res = c.post(format!("{}/api/register", app.base_url))
        .json(&json!({"name": "Tester", "email": email, "password": password, "password_confirmation": password}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);

    // Login
    let res = c.post(format!("{}/api/login", app.base_url))
        .json(&json!({"email": email, "password": password}))
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let second = body["access_token"].as_str().unwrap_or_default().to_string();
    assert_ne!(first, second);

    // Profile
    let res = c.get(format!("{}/api/profile", app.base_url)).bearer_auth(&second).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["user"]["name"], "Tester");
    assert!(body["user"].get("password").is_none());

    // Logout with the first token leaves the second usable
    let res = c.post(format!("{}/api/logout", app.base_url)).bearer_auth(&first).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = c.get(format!("{}/api/profile", app.base_url)).bearer_auth(&first).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    let res = c.get(format!("{}/api/profile", app.base_url)).bearer_auth(&second).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    let app = start_memory_server().await?;
    let res = reqwest::get(format!("{}/health", app.base_url)).await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_memory_full_session() -> anyhow::Result<()> {
    let app = start_memory_server().await?;
    full_session(&app).await
}

#[tokio::test]
async fn e2e_postgres_full_session() -> anyhow::Result<()> {
    let Some(app) = start_postgres_server().await? else { return Ok(()) };
    full_session(&app).await
}

#[tokio::test]
async fn e2e_protected_without_token_denied() -> anyhow::Result<()> {
    let app = start_memory_server().await?;
    let c = reqwest::Client::new();
    let res = c.get(format!("{}/api/profile", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Unauthenticated.");
    Ok(())
}

#[tokio::test]
async fn e2e_expired_token_unauthorized() -> anyhow::Result<()> {
    use std::sync::Arc;
    use server::routes::{self, auth};
    use service::auth::{
        domain::RegisterInput,
        hasher::Argon2Hasher,
        repo::memory::{MemoryTokenStore, MemoryUserStore},
        AuthService,
    };

    // tokens expire one minute before they are issued
    let svc = AuthService::with_stores(
        Arc::new(MemoryUserStore::default()),
        Arc::new(MemoryTokenStore::default()),
        Arc::new(Argon2Hasher::low_cost()?),
        "e2e-test-secret-0123456789",
        chrono::Duration::minutes(-1),
    );
    let session = svc.register(RegisterInput::new("Tester", "t@example.com", "password123", "password123")).await?;
    let state = auth::ServerState::new(Arc::new(svc), auth::ServerAuthConfig::default());
    let app = serve(routes::build_router(state, tower_http::cors::CorsLayer::very_permissive())).await?;

    let res = reqwest::Client::new()
        .get(format!("{}/api/profile", app.base_url))
        .bearer_auth(&session.access_token)
        .send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);
    Ok(())
}

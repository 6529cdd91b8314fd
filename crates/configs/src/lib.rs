use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

const MEMORY_URL_PREFIX: &str = "memory://";
const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            run_migrations: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_true() -> bool { true }

/// Token signing and login response behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
    /// Status returned with `{"message": "Invalid credentials"}`; 200 or 401.
    #[serde(default = "default_login_failure_status")]
    pub login_failure_status: u16,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl(),
            login_failure_status: default_login_failure_status(),
        }
    }
}

// one year, personal tokens are long lived
fn default_token_ttl() -> u64 { 365 * 24 * 3600 }
fn default_login_failure_status() -> u16 { 200 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { format: default_log_format() }
    }
}

fn default_log_format() -> String { "compact".into() }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

/// Build a config purely from environment variables.
pub fn from_env() -> AppConfig {
    let mut cfg = AppConfig::default();
    if let Ok(host) = std::env::var("SERVER_HOST") {
        cfg.server.host = host;
    }
    if let Some(port) = env_parse::<u16>("SERVER_PORT") {
        cfg.server.port = port;
    }
    cfg.server.worker_threads = env_parse::<usize>("TOKIO_WORKER_THREADS").or(cfg.server.worker_threads);
    if let Some(ttl) = env_parse::<u64>("TOKEN_TTL_SECS") {
        cfg.auth.token_ttl_secs = ttl;
    }
    if let Some(status) = env_parse::<u16>("LOGIN_FAILURE_STATUS") {
        cfg.auth.login_failure_status = status;
    }
    if let Ok(format) = std::env::var("LOG_FORMAT") {
        cfg.logging.format = format;
    }
    cfg
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to the environment
    /// when the file is absent, then normalize and validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => from_env(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env(self.database.backend());
        self.auth.validate(self.database.backend())?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn backend(&self) -> StorageBackend {
        if self.url.trim().to_lowercase().starts_with(MEMORY_URL_PREFIX) {
            StorageBackend::Memory
        } else {
            StorageBackend::Postgres
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        if self.backend() == StorageBackend::Memory {
            return Ok(());
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql://, postgres:// or memory://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    fn normalize_from_env(&mut self, backend: StorageBackend) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.jwt_secret.trim().is_empty() && backend == StorageBackend::Memory {
            self.jwt_secret = DEV_JWT_SECRET.to_string();
        }
    }

    pub fn validate(&self, backend: StorageBackend) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if backend == StorageBackend::Postgres && self.jwt_secret.len() < 16 {
            return Err(anyhow!("auth.jwt_secret must be at least 16 bytes"));
        }
        if self.token_ttl_secs == 0 {
            return Err(anyhow!("auth.token_ttl_secs must be positive"));
        }
        if !matches!(self.login_failure_status, 200 | 401) {
            return Err(anyhow!("auth.login_failure_status must be 200 or 401"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> AppConfig {
        toml::from_str(toml_src).expect("valid toml")
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg = parse("[database]\nurl = \"memory://\"\n");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.auth.login_failure_status, 200);
        assert_eq!(cfg.auth.token_ttl_secs, 365 * 24 * 3600);
        assert!(cfg.database.run_migrations);
        assert_eq!(cfg.logging.format, "compact");
    }

    #[test]
    fn memory_backend_gets_dev_secret() {
        let mut cfg = parse("[database]\nurl = \"memory://\"\n");
        cfg.auth.normalize_from_env(StorageBackend::Memory);
        assert!(!cfg.auth.jwt_secret.is_empty());
        assert!(cfg.auth.validate(StorageBackend::Memory).is_ok());
        assert_eq!(cfg.database.backend(), StorageBackend::Memory);
    }

    #[test]
    fn postgres_requires_long_secret() {
        let cfg = parse(
            "[database]\nurl = \"postgres://u:p@localhost/db\"\n[auth]\njwt_secret = \"short\"\n",
        );
        assert_eq!(cfg.database.backend(), StorageBackend::Postgres);
        assert!(cfg.database.validate().is_ok());
        assert!(cfg.auth.validate(StorageBackend::Postgres).is_err());
    }

    #[test]
    fn rejects_unknown_database_scheme() {
        let cfg = parse("[database]\nurl = \"mysql://localhost/db\"\n");
        assert!(cfg.database.validate().is_err());
    }

    #[test]
    fn login_failure_status_is_restricted() {
        let mut cfg = parse("[auth]\njwt_secret = \"0123456789abcdef\"\nlogin_failure_status = 403\n");
        assert!(cfg.auth.validate(StorageBackend::Postgres).is_err());
        cfg.auth.login_failure_status = 401;
        assert!(cfg.auth.validate(StorageBackend::Postgres).is_ok());
    }

    #[test]
    fn zero_worker_threads_normalized() {
        let mut cfg = parse("[server]\nhost = \"\"\nport = 9000\nworker_threads = 0\n");
        cfg.server.normalize().expect("normalize");
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_from_file("/nonexistent/account-api.toml").unwrap_err();
        assert!(is_not_found(&err));
    }
}

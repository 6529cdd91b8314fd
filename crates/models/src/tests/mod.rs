/// CRUD operations tests for users and access tokens
pub mod crud_tests;

/// Postgres-backed tests run only when a database is configured.
pub(crate) fn db_tests_enabled() -> bool {
    std::env::var("SKIP_DB_TESTS").is_err() && std::env::var("DATABASE_URL").is_ok()
}

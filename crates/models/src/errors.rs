use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
}

/// Map a SeaORM error, singling out unique-constraint violations.
pub(crate) fn from_db_err(e: DbErr) -> ModelError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => ModelError::Conflict(detail),
        _ => ModelError::Db(e.to_string()),
    }
}

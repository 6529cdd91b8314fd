//! Store implementations: SeaORM/Postgres for deployments, in-memory for tests and `memory://`.

pub mod memory;
pub mod seaorm;

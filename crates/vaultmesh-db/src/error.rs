//! Database error types, mirroring the shape of a real repo-layer error
//! enum (the teacher's `openibank-db::error::DbError`) even though this
//! store is in-process rather than a live SQL connection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type DbResult<T> = Result<T, DbError>;

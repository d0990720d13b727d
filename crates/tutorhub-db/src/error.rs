//! Database-specific error types and conversions.

use tutorhub_core::error::TutorError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Corrupt {entity} row: {message}")]
    CorruptRow {
        entity: &'static str,
        message: String,
    },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for TutorError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TutorError::NotFound { entity, id },
            other => TutorError::Database(other.to_string()),
        }
    }
}

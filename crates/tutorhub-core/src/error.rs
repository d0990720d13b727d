//! Error types for the TutorHub booking core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Teacher is currently unavailable for bookings")]
    TeacherUnavailable,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Exchange rate unavailable: {0}")]
    ExchangeRate(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type TutorResult<T> = Result<T, TutorError>;

impl TutorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// HTTP status an API layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            TutorError::Validation { .. } => 422,
            TutorError::TeacherUnavailable | TutorError::Conflict { .. } => 400,
            TutorError::Forbidden { .. } => 403,
            TutorError::NotFound { .. } => 404,
            TutorError::Database(_) | TutorError::ExchangeRate(_) | TutorError::Internal(_) => 500,
        }
    }

    /// Infrastructure failures are not the caller's fault and are safe
    /// to resubmit.
    pub fn is_transient(&self) -> bool {
        self.status_code() >= 500
    }

    /// Message that can be shown to the client. Infrastructure errors
    /// are replaced with a generic text so internals do not leak.
    pub fn public_message(&self) -> String {
        if self.is_transient() {
            "Something went wrong while processing the booking. Please try again.".into()
        } else {
            self.to_string()
        }
    }
}

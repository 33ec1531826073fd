//! Error types shared by every Tollgate crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TollgateError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    Conflict { entity: String },

    /// Raw storage failure. Services convert this into [`TollgateError::Internal`]
    /// before it leaves the engine.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TollgateError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type TollgateResult<T> = Result<T, TollgateError>;

//! Engine-specific error types.

use tollgate_core::error::TollgateError;
use thiserror::Error;

/// Rejections raised while registering services into the catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("service key must not be empty")]
    EmptyKey,

    #[error("service {0:?} is already registered")]
    DuplicateKey(String),

    #[error("service {0:?} is not offered in any environment")]
    NoEnvironments(String),

    #[error("service {key:?} declares a permission without {field}")]
    IncompletePermission { key: String, field: &'static str },
}

impl From<CatalogError> for TollgateError {
    fn from(err: CatalogError) -> Self {
        TollgateError::InvalidInput {
            message: err.to_string(),
        }
    }
}

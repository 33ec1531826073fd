//! Startup errors.

use thiserror::Error;
use tollgate_authz::CatalogError;
use tollgate_core::error::TollgateError;
use tollgate_db::DbError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    #[error("invalid service catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("database connection failed: {0}")]
    Connect(#[from] surrealdb::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] DbError),

    #[error("startup sync failed: {0}")]
    Sync(#[from] TollgateError),

    #[error("signal handler failed: {0}")]
    Signal(std::io::Error),
}

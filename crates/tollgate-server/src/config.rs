//! Server configuration, loaded from a TOML file.

use std::path::Path;

use serde::Deserialize;
use tollgate_authz::AuthzConfig;
use tollgate_core::models::scope::{UpdateScopeGroup, UpsertScope};
use tollgate_db::DbConfig;

use crate::error::ServerError;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TOLLGATE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub authz: AuthzConfig,
    /// Scopes registered at startup. Existing scopes are updated in place.
    pub scopes: Vec<UpsertScope>,
    pub scope_groups: Vec<UpdateScopeGroup>,
}

impl ServerConfig {
    /// Load from the file named by `TOLLGATE_CONFIG`, or fall back to
    /// defaults when the variable is unset.
    pub fn load() -> Result<Self, ServerError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ServerError::ReadConfig {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(raw)?)
    }
}

//! Engine configuration.

use std::time::Duration;

use serde::Deserialize;
use tollgate_core::models::service::Service;

/// Configuration for the authorization engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Upper bound for a single storage round trip, in milliseconds
    /// (default: 5000). Exceeding it aborts the operation with `Timeout`.
    pub storage_timeout_ms: u64,
    /// Description given to the Owner role created on activation.
    pub owner_role_description: String,
    /// Integrated services, registered into the
    /// [`ServiceCatalog`](crate::catalog::ServiceCatalog) at startup.
    pub services: Vec<Service>,
}

impl AuthzConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            storage_timeout_ms: 5_000,
            owner_role_description: "Organization owner with all default permissions".into(),
            services: Vec::new(),
        }
    }
}

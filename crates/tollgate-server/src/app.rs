//! Startup wiring of the engine onto a database connection.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::Client;
use tollgate_authz::{ScopeRegistry, ServiceCatalog};
use tollgate_core::models::scope::{UpdateScopeGroup, UpsertScope};
use tollgate_db::repository::SurrealScopeRepository;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::ServerError;

pub struct App {
    scopes: ScopeRegistry<SurrealScopeRepository<Client>>,
}

impl App {
    /// Validate the configured service catalog and open the scope registry.
    pub fn build(db: &Surreal<Client>, config: &ServerConfig) -> Result<Self, ServerError> {
        let authz = &config.authz;
        let catalog = ServiceCatalog::from_services(authz.services.iter().cloned())?;
        for service in catalog.iter() {
            debug!(
                key = %service.key,
                default_grant = service.default_grant,
                permissions = service.permissions.len(),
                "Service registered"
            );
        }
        info!(
            services = catalog.len(),
            default_services = catalog.default_services().count(),
            "Service catalog loaded"
        );

        Ok(Self {
            scopes: ScopeRegistry::new(SurrealScopeRepository::new(db.clone()), authz),
        })
    }

    /// Register the configured scope groups and scopes.
    pub async fn sync_scopes(
        &self,
        groups: &[UpdateScopeGroup],
        scopes: &[UpsertScope],
    ) -> Result<(), ServerError> {
        for group in groups {
            self.scopes.update_group(group.clone()).await?;
        }
        for scope in scopes {
            self.scopes.upsert_scope(scope.clone()).await?;
        }
        info!(groups = groups.len(), scopes = scopes.len(), "Scopes synced");
        Ok(())
    }
}

//! Registry of integrated services.
//!
//! Services are registered by key once, at startup, into an immutable map.
//! Invalid or duplicate registrations are rejected here so that lookups at
//! request time never have to deal with them.

use std::collections::BTreeMap;

use tollgate_core::models::service::Service;

use crate::error::CatalogError;

/// Immutable key → service mapping, iterated in key order.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: BTreeMap<String, Service>,
}

impl ServiceCatalog {
    pub fn builder() -> ServiceCatalogBuilder {
        ServiceCatalogBuilder::default()
    }

    /// Build a catalog from a list of definitions, e.g. loaded from config.
    pub fn from_services(
        services: impl IntoIterator<Item = Service>,
    ) -> Result<Self, CatalogError> {
        services
            .into_iter()
            .try_fold(Self::builder(), ServiceCatalogBuilder::register)
            .map(ServiceCatalogBuilder::build)
    }

    pub fn get(&self, key: &str) -> Option<&Service> {
        self.services.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Services granted to every organization on activation.
    pub fn default_services(&self) -> impl Iterator<Item = &Service> {
        self.services.values().filter(|s| s.default_grant)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ServiceCatalogBuilder {
    services: BTreeMap<String, Service>,
}

impl ServiceCatalogBuilder {
    pub fn register(mut self, service: Service) -> Result<Self, CatalogError> {
        if service.key.trim().is_empty() {
            return Err(CatalogError::EmptyKey);
        }
        if service.environments.is_empty() {
            return Err(CatalogError::NoEnvironments(service.key));
        }
        for permission in &service.permissions {
            let missing = if permission.resource.trim().is_empty() {
                Some("resource")
            } else if permission.action.trim().is_empty() {
                Some("action")
            } else {
                None
            };
            if let Some(field) = missing {
                return Err(CatalogError::IncompletePermission {
                    key: service.key,
                    field,
                });
            }
        }
        if self.services.contains_key(&service.key) {
            return Err(CatalogError::DuplicateKey(service.key));
        }
        self.services.insert(service.key.clone(), service);
        Ok(self)
    }

    pub fn build(self) -> ServiceCatalog {
        ServiceCatalog {
            services: self.services,
        }
    }
}

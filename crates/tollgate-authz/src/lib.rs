//! Tollgate authz: role grants, consent negotiation and organization
//! bootstrap on top of the repository traits in `tollgate-core`.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod consent;
pub mod error;
pub mod grant_engine;
mod guard;
pub mod scope_registry;

pub use bootstrap::OrgBootstrapper;
pub use catalog::ServiceCatalog;
pub use config::AuthzConfig;
pub use consent::{ConsentNegotiator, ConsentRequest};
pub use error::CatalogError;
pub use grant_engine::GrantEngine;
pub use scope_registry::ScopeRegistry;

//! SurrealDB repository implementations.

mod consent;
mod organization;
mod permission;
mod role;
mod scope;

pub use consent::SurrealConsentRepository;
pub use organization::SurrealOrganizationRepository;
pub use permission::SurrealOrgPermissionRepository;
pub use role::SurrealRoleRepository;
pub use scope::SurrealScopeRepository;

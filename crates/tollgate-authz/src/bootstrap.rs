//! Organization lifecycle: creation, updates and one-time activation.

use tollgate_core::error::{TollgateError, TollgateResult};
use tollgate_core::models::grant::NewGrant;
use tollgate_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use tollgate_core::models::role::{RoleFilter, RoleSort};
use tollgate_core::repository::{
    OrgPermissionRepository, OrganizationRepository, Pagination, RoleRepository,
};
use tollgate_core::validation;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::catalog::ServiceCatalog;
use crate::config::AuthzConfig;
use crate::grant_engine::GrantEngine;

/// Brings organizations to their initial authorization state.
///
/// Activation seeds the baseline role with every default service of the
/// catalog and creates the `Owner` role holding all default organization
/// permissions. It runs its seeding steps at most once per organization:
/// an organization that already has roles is considered bootstrapped.
pub struct OrgBootstrapper<R, P, O>
where
    R: RoleRepository,
    P: OrgPermissionRepository,
    O: OrganizationRepository,
{
    grants: GrantEngine<R, P, O>,
    catalog: ServiceCatalog,
    owner_description: String,
}

impl<R, P, O> OrgBootstrapper<R, P, O>
where
    R: RoleRepository,
    P: OrgPermissionRepository,
    O: OrganizationRepository,
{
    pub fn new(grants: GrantEngine<R, P, O>, catalog: ServiceCatalog, config: &AuthzConfig) -> Self {
        Self {
            grants,
            catalog,
            owner_description: config.owner_role_description.clone(),
        }
    }

    pub fn grants(&self) -> &GrantEngine<R, P, O> {
        &self.grants
    }

    /// Create an organization and expose the permissions of every default
    /// service to it. A service that fails to expose is logged and skipped.
    pub async fn create_org(&self, input: CreateOrganization) -> TollgateResult<Organization> {
        validation::non_empty("name", &input.name)?;
        validation::non_empty("contact_email", &input.contact_email)?;

        let org = self.grants.org_create(input).await?;
        info!(org_id = %org.id, name = %org.name, "Organization created");

        for service in self.catalog.default_services() {
            for &environment in &service.environments {
                if let Err(e) = self.grants.expose_service(org.id, service, environment).await {
                    warn!(
                        org_id = %org.id,
                        service = %service.key,
                        environment = %environment,
                        error = %e,
                        "Failed to expose default service, skipping"
                    );
                }
            }
        }
        Ok(org)
    }

    pub async fn get_org(&self, id: Uuid) -> TollgateResult<Organization> {
        validation::required_id("org_id", id)?;
        self.grants.org_get(id).await
    }

    pub async fn update_org(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> TollgateResult<Organization> {
        validation::required_id("org_id", id)?;
        if let Some(name) = &input.name {
            validation::non_empty("name", name)?;
        }
        if let Some(email) = &input.contact_email {
            validation::non_empty("contact_email", email)?;
        }

        let org = self.grants.org_update(id, input).await?;
        info!(org_id = %org.id, "Organization updated");
        Ok(org)
    }

    /// Activate an organization on behalf of `user_id`, who becomes the
    /// sole member of its `Owner` role. Safe to call repeatedly.
    pub async fn activate_org(&self, user_id: Uuid, org_id: Uuid) -> TollgateResult<Uuid> {
        validation::required_id("user_id", user_id)?;
        validation::required_id("org_id", org_id)?;

        // 1. Mark activated. Already active organizations pass unchanged.
        self.grants
            .org_activate(org_id)
            .await
            .map_err(|e| fatal("activate", org_id, e))?;
        info!(org_id = %org_id, user_id = %user_id, "Organization activated");

        // 2. Seeding happens once: any existing role means it already ran.
        let existing = self
            .grants
            .list_roles(
                RoleFilter {
                    org_id: Some(org_id),
                    ..Default::default()
                },
                Pagination {
                    offset: 0,
                    limit: 1,
                },
                RoleSort::default(),
            )
            .await
            .map_err(|e| fatal("check_roles", org_id, e))?;
        if existing.total > 0 {
            info!(org_id = %org_id, roles = existing.total, "Organization already bootstrapped");
            return Ok(org_id);
        }

        // 3. Default services go to the baseline role. Best effort.
        for service in self.catalog.default_services() {
            for &environment in &service.environments {
                let grant = NewGrant {
                    role_id: org_id,
                    grant_id: service.id(),
                    environment,
                    is_default: true,
                };
                if let Err(e) = self.grants.assign_service(user_id, grant).await {
                    warn!(
                        org_id = %org_id,
                        service = %service.key,
                        environment = %environment,
                        error = %e,
                        "Failed to grant default service, skipping"
                    );
                }
            }
        }

        // 4. Owner role with the activating user as its only member.
        let permissions = self
            .grants
            .org_permissions(org_id, true)
            .await
            .map_err(|e| fatal("list_default_permissions", org_id, e))?;
        let owner = self
            .grants
            .create_owner_role(org_id, user_id, &self.owner_description)
            .await
            .map_err(|e| fatal("create_owner_role", org_id, e))?;

        // 5. Every default permission goes to Owner. All or nothing from
        //    the caller's point of view; applied grants are not rolled back.
        for permission in &permissions {
            let grant = NewGrant {
                role_id: owner.id,
                grant_id: permission.id,
                environment: permission.environment,
                is_default: true,
            };
            self.grants
                .role_grant(grant)
                .await
                .map_err(|e| fatal("grant_owner_permission", org_id, e))?;
        }

        info!(
            org_id = %org_id,
            owner_role_id = %owner.id,
            permissions = permissions.len(),
            "Organization bootstrapped"
        );
        Ok(org_id)
    }
}

/// Activation errors reach the caller as `NotFound`, `InvalidInput` or
/// `Timeout` when they are one of those, and as `Internal` otherwise.
fn fatal(step: &'static str, org_id: Uuid, err: TollgateError) -> TollgateError {
    match err {
        e @ (TollgateError::NotFound { .. }
        | TollgateError::InvalidInput { .. }
        | TollgateError::Timeout { .. }) => e,
        e => {
            error!(org_id = %org_id, step, error = %e, "Organization activation failed");
            TollgateError::Internal(format!("activate_org failed at {step}"))
        }
    }
}

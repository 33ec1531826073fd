//! Grant engine: roles, organization permissions and grants.
//!
//! Roles belong to exactly one organization. Grants attach an opaque grant
//! ID (a service ID or an organization permission ID) to a role in one
//! environment. Each organization also owns a *baseline role*: a synthetic
//! role whose ID is the organization ID itself. It carries the default
//! service entitlements and is never stored as a [`Role`].

use tollgate_core::error::{TollgateError, TollgateResult};
use tollgate_core::models::grant::{Environment, NewGrant, RoleGrant};
use tollgate_core::models::organization::{CreateOrganization, Organization, UpdateOrganization};
use tollgate_core::models::permission::{CreateOrgPermission, OrgPermission};
use tollgate_core::models::role::{CreateRole, OWNER_ROLE_NAME, Role, RoleFilter, RoleSort};
use tollgate_core::models::service::Service;
use tollgate_core::repository::{
    OrgPermissionRepository, OrganizationRepository, PaginatedResult, Pagination, RoleRepository,
};
use tollgate_core::validation;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthzConfig;
use crate::guard::StorageGuard;

/// Largest page `list_roles` will return.
pub const MAX_PAGE_SIZE: u64 = 500;

pub struct GrantEngine<R, P, O>
where
    R: RoleRepository,
    P: OrgPermissionRepository,
    O: OrganizationRepository,
{
    role_repo: R,
    permission_repo: P,
    org_repo: O,
    storage: StorageGuard,
}

impl<R, P, O> GrantEngine<R, P, O>
where
    R: RoleRepository,
    P: OrgPermissionRepository,
    O: OrganizationRepository,
{
    pub fn new(role_repo: R, permission_repo: P, org_repo: O, config: &AuthzConfig) -> Self {
        Self {
            role_repo,
            permission_repo,
            org_repo,
            storage: StorageGuard::new(config.storage_timeout()),
        }
    }

    /// Create a role. The `Owner` name is reserved for bootstrap.
    pub async fn create_role(&self, input: CreateRole) -> TollgateResult<Role> {
        if input.name.trim().eq_ignore_ascii_case(OWNER_ROLE_NAME) {
            return Err(TollgateError::invalid(format!(
                "role name {OWNER_ROLE_NAME:?} is reserved"
            )));
        }
        self.insert_role(input).await
    }

    /// Create the reserved Owner role with `user_id` as its only member.
    pub(crate) async fn create_owner_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        description: &str,
    ) -> TollgateResult<Role> {
        self.insert_role(CreateRole {
            org_id,
            name: OWNER_ROLE_NAME.into(),
            description: description.into(),
            creator_id: user_id,
            members: vec![user_id],
        })
        .await
    }

    async fn insert_role(&self, mut input: CreateRole) -> TollgateResult<Role> {
        validation::required_id("org_id", input.org_id)?;
        validation::required_id("creator_id", input.creator_id)?;
        validation::non_empty("name", &input.name)?;
        if input.members.iter().any(Uuid::is_nil) {
            return Err(TollgateError::invalid("member ids must not be nil"));
        }
        input.name = input.name.trim().to_string();
        let mut seen = Vec::with_capacity(input.members.len());
        input.members.retain(|m| {
            let fresh = !seen.contains(m);
            seen.push(*m);
            fresh
        });

        let org_id = input.org_id;
        let role = self
            .storage
            .run("create_role", org_id, self.role_repo.create(input))
            .await?;
        info!(
            org_id = %role.org_id,
            role_id = %role.id,
            name = %role.name,
            "Role created"
        );
        Ok(role)
    }

    pub async fn get_role(&self, id: Uuid) -> TollgateResult<Role> {
        validation::required_id("role_id", id)?;
        self.storage
            .run("get_role", id, self.role_repo.get_by_id(id))
            .await
    }

    pub async fn list_roles(
        &self,
        filter: RoleFilter,
        pagination: Pagination,
        sort: RoleSort,
    ) -> TollgateResult<PaginatedResult<Role>> {
        if pagination.limit == 0 || pagination.limit > MAX_PAGE_SIZE {
            return Err(TollgateError::invalid(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let subject = filter
            .org_id
            .map_or_else(|| "*".to_string(), |id| id.to_string());
        self.storage
            .run(
                "list_roles",
                subject,
                self.role_repo.list(filter, sort, pagination),
            )
            .await
    }

    /// Attach a grant to a stored role or to an organization's baseline
    /// role on behalf of `user_id`. Returns the grant record ID, which is
    /// the same for every call with the same (role, grant, environment).
    pub async fn assign_service(&self, user_id: Uuid, grant: NewGrant) -> TollgateResult<Uuid> {
        validation::required_id("user_id", user_id)?;
        validate_grant(&grant)?;
        self.ensure_grantee(grant.role_id).await?;

        let stored = self.attach(grant, Some(user_id)).await?;
        debug!(
            user_id = %user_id,
            role_id = %stored.role_id,
            grant_id = %stored.grant_id,
            environment = %stored.environment,
            "Service assigned"
        );
        Ok(stored.id)
    }

    /// Attach a grant to a stored role and return the role with the grant
    /// reflected in its grant set.
    pub async fn role_grant(&self, grant: NewGrant) -> TollgateResult<Role> {
        validate_grant(&grant)?;
        let mut role = self.get_role(grant.role_id).await?;

        let stored = self.attach(grant, None).await?;
        if !role.grant_ids.contains(&stored.grant_id) {
            role.grant_ids.push(stored.grant_id);
        }
        Ok(role)
    }

    /// Grant records attached to a role (or baseline role), oldest first.
    pub async fn role_grants(&self, role_id: Uuid) -> TollgateResult<Vec<RoleGrant>> {
        validation::required_id("role_id", role_id)?;
        self.storage
            .run("role_grants", role_id, self.role_repo.get_grants(role_id))
            .await
    }

    /// Create the organization permissions `service` contributes in
    /// `environment`. Permissions the organization already has are
    /// returned as stored.
    pub async fn expose_service(
        &self,
        org_id: Uuid,
        service: &Service,
        environment: Environment,
    ) -> TollgateResult<Vec<OrgPermission>> {
        validation::required_id("org_id", org_id)?;
        if !service.environments.contains(&environment) {
            return Err(TollgateError::invalid(format!(
                "service {:?} is not offered in {environment}",
                service.key
            )));
        }

        let mut exposed = Vec::with_capacity(service.permissions.len());
        for permission in &service.permissions {
            let input = CreateOrgPermission {
                org_id,
                resource: permission.resource.clone(),
                action: permission.action.clone(),
                allow: permission.allow,
                environment,
                groups: Vec::new(),
                users: Vec::new(),
                is_default: permission.is_default,
            };
            let stored = self
                .storage
                .run("expose_service", org_id, self.permission_repo.create(input))
                .await?;
            exposed.push(stored);
        }
        info!(
            org_id = %org_id,
            service = %service.key,
            environment = %environment,
            permissions = exposed.len(),
            "Service exposed"
        );
        Ok(exposed)
    }

    pub async fn org_permissions(
        &self,
        org_id: Uuid,
        defaults_only: bool,
    ) -> TollgateResult<Vec<OrgPermission>> {
        validation::required_id("org_id", org_id)?;
        self.storage
            .run(
                "org_permissions",
                org_id,
                self.permission_repo.list(org_id, defaults_only),
            )
            .await
    }

    pub(crate) async fn org_create(&self, input: CreateOrganization) -> TollgateResult<Organization> {
        let name = input.name.clone();
        self.storage
            .run("create_org", name, self.org_repo.create(input))
            .await
    }

    pub(crate) async fn org_get(&self, id: Uuid) -> TollgateResult<Organization> {
        self.storage
            .run("get_org", id, self.org_repo.get_by_id(id))
            .await
    }

    pub(crate) async fn org_update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> TollgateResult<Organization> {
        self.storage
            .run("update_org", id, self.org_repo.update(id, input))
            .await
    }

    pub(crate) async fn org_activate(&self, id: Uuid) -> TollgateResult<Organization> {
        self.storage
            .run("activate_org", id, self.org_repo.activate(id))
            .await
    }

    /// A grantee is a stored role or an organization (its baseline role).
    async fn ensure_grantee(&self, role_id: Uuid) -> TollgateResult<()> {
        match self.get_role(role_id).await {
            Ok(_) => return Ok(()),
            Err(TollgateError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        match self.org_get(role_id).await {
            Ok(_) => Ok(()),
            Err(TollgateError::NotFound { .. }) => Err(TollgateError::not_found("role", role_id)),
            Err(e) => Err(e),
        }
    }

    async fn attach(&self, grant: NewGrant, assigned_by: Option<Uuid>) -> TollgateResult<RoleGrant> {
        let role_id = grant.role_id;
        self.storage
            .run("grant", role_id, self.role_repo.grant(grant, assigned_by))
            .await
    }
}

fn validate_grant(grant: &NewGrant) -> TollgateResult<()> {
    validation::required_id("role_id", grant.role_id)?;
    validation::required_id("grant_id", grant.grant_id)
}

//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and perform a single storage round
//! trip where possible. Uniqueness guarantees the engine relies on (grant
//! tuples, role names per organization, permissions per organization) are
//! enforced here, not by callers.

use uuid::Uuid;

use crate::error::TollgateResult;
use crate::models::{
    consent::{ConsentGrant, CreateConsentGrant},
    grant::{NewGrant, RoleGrant},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    permission::{CreateOrgPermission, OrgPermission},
    role::{CreateRole, Role, RoleFilter, RoleSort},
    scope::{Scope, ScopeGroupInfo, UpdateScopeGroup, UpsertScope},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = TollgateResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TollgateResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = TollgateResult<Organization>> + Send;
    /// Set the activation flag. Activating an active organization changes
    /// nothing and still succeeds.
    fn activate(&self, id: Uuid) -> impl Future<Output = TollgateResult<Organization>> + Send;
}

// ---------------------------------------------------------------------------
// Roles & grants (organization-scoped)
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    /// Fails with `Conflict` when the organization already has a role with
    /// the same name.
    fn create(&self, input: CreateRole) -> impl Future<Output = TollgateResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = TollgateResult<Role>> + Send;
    fn list(
        &self,
        filter: RoleFilter,
        sort: RoleSort,
        pagination: Pagination,
    ) -> impl Future<Output = TollgateResult<PaginatedResult<Role>>> + Send;

    /// Attach a grant. Granting an existing (role, grant, environment) tuple
    /// returns the stored record unchanged. Does not check that the role
    /// exists.
    fn grant(
        &self,
        grant: NewGrant,
        assigned_by: Option<Uuid>,
    ) -> impl Future<Output = TollgateResult<RoleGrant>> + Send;

    /// All grants attached to a role, oldest first.
    fn get_grants(&self, role_id: Uuid)
    -> impl Future<Output = TollgateResult<Vec<RoleGrant>>> + Send;
}

pub trait OrgPermissionRepository: Send + Sync {
    /// Returns the existing record when the organization already has a
    /// permission for the same (resource, action, environment).
    fn create(
        &self,
        input: CreateOrgPermission,
    ) -> impl Future<Output = TollgateResult<OrgPermission>> + Send;
    fn list(
        &self,
        org_id: Uuid,
        defaults_only: bool,
    ) -> impl Future<Output = TollgateResult<Vec<OrgPermission>>> + Send;
}

// ---------------------------------------------------------------------------
// Scopes & consent
// ---------------------------------------------------------------------------

pub trait ScopeRepository: Send + Sync {
    fn upsert(&self, input: UpsertScope) -> impl Future<Output = TollgateResult<Scope>> + Send;
    fn upsert_group(
        &self,
        input: UpdateScopeGroup,
    ) -> impl Future<Output = TollgateResult<ScopeGroupInfo>> + Send;
    /// Scopes whose IDs are in `ids`. Unknown IDs are omitted.
    fn get_by_ids(&self, ids: &[String])
    -> impl Future<Output = TollgateResult<Vec<Scope>>> + Send;
    /// Groups whose names are in `names`. Unknown names are omitted.
    fn get_groups(
        &self,
        names: &[String],
    ) -> impl Future<Output = TollgateResult<Vec<ScopeGroupInfo>>> + Send;
}

/// Append-only consent history.
pub trait ConsentRepository: Send + Sync {
    /// Record a new grant. Duplicate scope IDs within the input are stored
    /// once, first occurrence wins.
    fn append(
        &self,
        input: CreateConsentGrant,
    ) -> impl Future<Output = TollgateResult<ConsentGrant>> + Send;
    fn latest(
        &self,
        user_id: Uuid,
        client_id: &str,
    ) -> impl Future<Output = TollgateResult<Option<ConsentGrant>>> + Send;
}

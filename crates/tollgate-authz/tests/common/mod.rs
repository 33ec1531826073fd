//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tollgate_authz::{AuthzConfig, GrantEngine, OrgBootstrapper, ServiceCatalog};
use tollgate_core::error::{TollgateError, TollgateResult};
use tollgate_core::models::grant::{Environment, NewGrant, RoleGrant};
use tollgate_core::models::role::{CreateRole, Role, RoleFilter, RoleSort};
use tollgate_core::models::scope::{Scope, ScopeGroupInfo, UpdateScopeGroup, UpsertScope};
use tollgate_core::models::service::{Service, ServicePermission};
use tollgate_core::repository::{PaginatedResult, Pagination, RoleRepository, ScopeRepository};
use tollgate_db::repository::{
    SurrealOrgPermissionRepository, SurrealOrganizationRepository, SurrealRoleRepository,
    SurrealScopeRepository,
};
use uuid::Uuid;

pub type Engine<R = SurrealRoleRepository<Db>> =
    GrantEngine<R, SurrealOrgPermissionRepository<Db>, SurrealOrganizationRepository<Db>>;
pub type Bootstrapper<R = SurrealRoleRepository<Db>> =
    OrgBootstrapper<R, SurrealOrgPermissionRepository<Db>, SurrealOrganizationRepository<Db>>;

pub async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tollgate_db::run_migrations(&db).await.unwrap();
    db
}

pub fn config() -> AuthzConfig {
    AuthzConfig::default()
}

pub fn service(
    key: &str,
    default_grant: bool,
    environments: Vec<Environment>,
    permissions: &[(&str, &str, bool)],
) -> Service {
    Service {
        key: key.into(),
        name: key.to_uppercase(),
        description: format!("{key} service"),
        environments,
        default_grant,
        permissions: permissions
            .iter()
            .map(|&(resource, action, is_default)| ServicePermission {
                resource: resource.into(),
                action: action.into(),
                allow: true,
                description: format!("{action} {resource}"),
                is_default,
            })
            .collect(),
    }
}

/// Two default services and one opt-in service.
///
/// Default permissions exposed per organization: billing read in both
/// environments plus storage read in production, three in total.
pub fn catalog() -> ServiceCatalog {
    ServiceCatalog::from_services([
        service(
            "billing",
            true,
            vec![Environment::Production, Environment::Sandbox],
            &[("billing:invoices", "read", true), ("billing:invoices", "refund", false)],
        ),
        service(
            "storage",
            true,
            vec![Environment::Production],
            &[("storage:buckets", "read", true)],
        ),
        service(
            "analytics",
            false,
            vec![Environment::Production],
            &[("analytics:reports", "read", true)],
        ),
    ])
    .unwrap()
}

pub fn engine_with<R: RoleRepository>(db: &Surreal<Db>, role_repo: R) -> Engine<R> {
    GrantEngine::new(
        role_repo,
        SurrealOrgPermissionRepository::new(db.clone()),
        SurrealOrganizationRepository::new(db.clone()),
        &config(),
    )
}

pub fn engine(db: &Surreal<Db>) -> Engine {
    engine_with(db, SurrealRoleRepository::new(db.clone()))
}

pub fn bootstrapper_with<R: RoleRepository>(db: &Surreal<Db>, role_repo: R) -> Bootstrapper<R> {
    OrgBootstrapper::new(engine_with(db, role_repo), catalog(), &config())
}

pub fn bootstrapper(db: &Surreal<Db>) -> Bootstrapper {
    bootstrapper_with(db, SurrealRoleRepository::new(db.clone()))
}

pub fn role_input(org_id: Uuid, name: &str) -> CreateRole {
    CreateRole {
        org_id,
        name: name.into(),
        description: format!("{name} role"),
        creator_id: Uuid::new_v4(),
        members: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

type GrantPredicate = Arc<dyn Fn(&NewGrant) -> bool + Send + Sync>;

/// Role repository whose `grant` fails for every request matching the
/// predicate. Everything else goes to the wrapped repository.
#[derive(Clone)]
pub struct FailingGrants<R> {
    inner: R,
    fail_when: GrantPredicate,
}

impl<R> FailingGrants<R> {
    pub fn new(inner: R, fail_when: impl Fn(&NewGrant) -> bool + Send + Sync + 'static) -> Self {
        Self {
            inner,
            fail_when: Arc::new(fail_when),
        }
    }
}

impl<R: RoleRepository> RoleRepository for FailingGrants<R> {
    async fn create(&self, input: CreateRole) -> TollgateResult<Role> {
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> TollgateResult<Role> {
        self.inner.get_by_id(id).await
    }

    async fn list(
        &self,
        filter: RoleFilter,
        sort: RoleSort,
        pagination: Pagination,
    ) -> TollgateResult<PaginatedResult<Role>> {
        self.inner.list(filter, sort, pagination).await
    }

    async fn grant(&self, grant: NewGrant, assigned_by: Option<Uuid>) -> TollgateResult<RoleGrant> {
        if (self.fail_when)(&grant) {
            return Err(TollgateError::Database("injected grant failure".into()));
        }
        self.inner.grant(grant, assigned_by).await
    }

    async fn get_grants(&self, role_id: Uuid) -> TollgateResult<Vec<RoleGrant>> {
        self.inner.get_grants(role_id).await
    }
}

/// Scope repository that stalls every lookup.
#[derive(Clone)]
pub struct SlowScopes<S> {
    inner: S,
    delay: Duration,
}

impl<S> SlowScopes<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<S: ScopeRepository> ScopeRepository for SlowScopes<S> {
    async fn upsert(&self, input: UpsertScope) -> TollgateResult<Scope> {
        self.inner.upsert(input).await
    }

    async fn upsert_group(&self, input: UpdateScopeGroup) -> TollgateResult<ScopeGroupInfo> {
        self.inner.upsert_group(input).await
    }

    async fn get_by_ids(&self, ids: &[String]) -> TollgateResult<Vec<Scope>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_by_ids(ids).await
    }

    async fn get_groups(&self, names: &[String]) -> TollgateResult<Vec<ScopeGroupInfo>> {
        self.inner.get_groups(names).await
    }
}

pub fn scope_repo(db: &Surreal<Db>) -> SurrealScopeRepository<Db> {
    SurrealScopeRepository::new(db.clone())
}

//! Integration tests for Role, grant and OrgPermission repositories using
//! in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tollgate_core::error::TollgateError;
use tollgate_core::models::grant::{Environment, NewGrant};
use tollgate_core::models::permission::CreateOrgPermission;
use tollgate_core::models::role::{CreateRole, RoleFilter, RoleSort, RoleSortKey, SortDirection};
use tollgate_core::repository::{OrgPermissionRepository, Pagination, RoleRepository};
use tollgate_db::repository::{SurrealOrgPermissionRepository, SurrealRoleRepository};
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tollgate_db::run_migrations(&db).await.unwrap();
    db
}

fn role(org_id: Uuid, name: &str, members: Vec<Uuid>) -> CreateRole {
    CreateRole {
        org_id,
        name: name.into(),
        description: format!("{name} role"),
        creator_id: Uuid::new_v4(),
        members,
    }
}

fn permission(org_id: Uuid, action: &str, is_default: bool) -> CreateOrgPermission {
    CreateOrgPermission {
        org_id,
        resource: "billing:invoices".into(),
        action: action.into(),
        allow: true,
        environment: Environment::Production,
        groups: vec!["finance".into()],
        users: Vec::new(),
        is_default,
    }
}

// ---------------------------------------------------------------------------
// Role tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_role() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let org_id = Uuid::new_v4();
    let alice = Uuid::new_v4();

    let created = repo.create(role(org_id, "admin", vec![alice])).await.unwrap();
    assert_eq!(created.org_id, org_id);
    assert_eq!(created.members, vec![alice]);
    assert!(created.grant_ids.is_empty());

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "admin");
    assert_eq!(fetched.members, vec![alice]);
}

#[tokio::test]
async fn duplicate_role_name_conflicts_within_org_only() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let org_id = Uuid::new_v4();

    repo.create(role(org_id, "editor", Vec::new())).await.unwrap();

    let result = repo.create(role(org_id, "editor", Vec::new())).await;
    assert!(
        matches!(result, Err(TollgateError::Conflict { .. })),
        "duplicate role name should be rejected"
    );

    // Same name in another organization is fine.
    repo.create(role(Uuid::new_v4(), "editor", Vec::new()))
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_role_is_not_found() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let result = repo.get_by_id(Uuid::new_v4()).await;
    assert!(matches!(result, Err(TollgateError::NotFound { .. })));
}

#[tokio::test]
async fn list_roles_with_filters_and_sorting() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let org_id = Uuid::new_v4();
    let other_org = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let viewer = repo.create(role(org_id, "Viewer", vec![alice])).await.unwrap();
    let auditor = repo.create(role(org_id, "Auditor", vec![alice, bob])).await.unwrap();
    repo.create(role(org_id, "Billing Admin", vec![bob])).await.unwrap();
    repo.create(role(other_org, "Viewer", vec![alice])).await.unwrap();

    let by_org = repo
        .list(
            RoleFilter {
                org_id: Some(org_id),
                ..Default::default()
            },
            RoleSort {
                key: RoleSortKey::Name,
                direction: SortDirection::Ascending,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_org.total, 3);
    let names: Vec<&str> = by_org.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Auditor", "Billing Admin", "Viewer"]);

    let alices = repo
        .list(
            RoleFilter {
                org_id: Some(org_id),
                member_id: Some(alice),
                ..Default::default()
            },
            RoleSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    let mut ids: Vec<Uuid> = alices.items.iter().map(|r| r.id).collect();
    ids.sort();
    let mut expected = vec![viewer.id, auditor.id];
    expected.sort();
    assert_eq!(ids, expected);

    let named = repo
        .list(
            RoleFilter {
                name: Some("admin".into()),
                ..Default::default()
            },
            RoleSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(named.items.len(), 1);
    assert_eq!(named.items[0].name, "Billing Admin");

    let by_ids = repo
        .list(
            RoleFilter {
                ids: Some(vec![viewer.id]),
                ..Default::default()
            },
            RoleSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_ids.items.len(), 1);
    assert_eq!(by_ids.items[0].id, viewer.id);
}

#[tokio::test]
async fn list_roles_paginates() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let org_id = Uuid::new_v4();

    for name in ["a", "b", "c", "d", "e"] {
        repo.create(role(org_id, name, Vec::new())).await.unwrap();
    }

    let page = repo
        .list(
            RoleFilter {
                org_id: Some(org_id),
                ..Default::default()
            },
            RoleSort {
                key: RoleSortKey::Name,
                direction: SortDirection::Descending,
            },
            Pagination {
                offset: 1,
                limit: 2,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["d", "c"]);
}

// ---------------------------------------------------------------------------
// Grant tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn granting_same_tuple_twice_stores_one_grant() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let created = repo
        .create(role(Uuid::new_v4(), "ops", Vec::new()))
        .await
        .unwrap();
    let grant = NewGrant {
        role_id: created.id,
        grant_id: Uuid::new_v4(),
        environment: Environment::Production,
        is_default: false,
    };

    let first = repo.grant(grant.clone(), None).await.unwrap();
    let second = repo.grant(grant.clone(), None).await.unwrap();
    assert_eq!(first.id, second.id);

    let grants = repo.get_grants(created.id).await.unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].grant_id, grant.grant_id);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.grant_ids, vec![grant.grant_id]);
}

#[tokio::test]
async fn concurrent_grants_of_same_tuple_store_one_grant() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let created = repo
        .create(role(Uuid::new_v4(), "ops", Vec::new()))
        .await
        .unwrap();
    let grant = NewGrant {
        role_id: created.id,
        grant_id: Uuid::new_v4(),
        environment: Environment::Sandbox,
        is_default: true,
    };

    let (a, b) = tokio::join!(
        repo.grant(grant.clone(), None),
        repo.grant(grant.clone(), None)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);
    assert_eq!(a.id, grant.record_id());

    let grants = repo.get_grants(created.id).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn concurrent_role_creation_yields_one_role() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let org_id = Uuid::new_v4();

    let (a, b) = tokio::join!(
        repo.create(role(org_id, "admin", Vec::new())),
        repo.create(role(org_id, "admin", Vec::new()))
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(TollgateError::Conflict { .. })))
    );

    let page = repo
        .list(
            RoleFilter {
                org_id: Some(org_id),
                ..Default::default()
            },
            RoleSort::default(),
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn environments_are_separate_grants() {
    let db = setup().await;
    let repo = SurrealRoleRepository::new(db);
    let created = repo
        .create(role(Uuid::new_v4(), "ops", Vec::new()))
        .await
        .unwrap();
    let grant_id = Uuid::new_v4();
    let assigner = Uuid::new_v4();

    for environment in Environment::ALL {
        repo.grant(
            NewGrant {
                role_id: created.id,
                grant_id,
                environment,
                is_default: true,
            },
            Some(assigner),
        )
        .await
        .unwrap();
    }

    let grants = repo.get_grants(created.id).await.unwrap();
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().all(|g| g.assigned_by == Some(assigner)));
    assert!(grants.iter().all(|g| g.is_default));

    // Role grant set lists the grant ID once.
    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.grant_ids, vec![grant_id]);
}

// ---------------------------------------------------------------------------
// OrgPermission tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn permission_is_never_duplicated() {
    let db = setup().await;
    let repo = SurrealOrgPermissionRepository::new(db);
    let org_id = Uuid::new_v4();

    let first = repo.create(permission(org_id, "read", true)).await.unwrap();
    let again = repo.create(permission(org_id, "read", true)).await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.groups, vec!["finance".to_string()]);

    let all = repo.list(org_id, false).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn concurrent_permission_creation_stores_one_record() {
    let db = setup().await;
    let repo = SurrealOrgPermissionRepository::new(db);
    let org_id = Uuid::new_v4();

    let (a, b) = tokio::join!(
        repo.create(permission(org_id, "read", true)),
        repo.create(permission(org_id, "read", true))
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);

    let all = repo.list(org_id, false).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn list_default_permissions_only() {
    let db = setup().await;
    let repo = SurrealOrgPermissionRepository::new(db);
    let org_id = Uuid::new_v4();

    repo.create(permission(org_id, "read", true)).await.unwrap();
    repo.create(permission(org_id, "write", false)).await.unwrap();
    repo.create(permission(Uuid::new_v4(), "read", true))
        .await
        .unwrap();

    let defaults = repo.list(org_id, true).await.unwrap();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].action, "read");

    let all = repo.list(org_id, false).await.unwrap();
    assert_eq!(all.len(), 2);
}

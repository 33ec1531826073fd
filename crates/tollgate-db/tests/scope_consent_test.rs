//! Integration tests for Scope and Consent repositories using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tollgate_core::models::consent::CreateConsentGrant;
use tollgate_core::models::scope::{UpdateScopeGroup, UpsertScope};
use tollgate_core::repository::{ConsentRepository, ScopeRepository};
use tollgate_db::repository::{SurrealConsentRepository, SurrealScopeRepository};
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    tollgate_db::run_migrations(&db).await.unwrap();
    db
}

fn scope(id: &str, group: &str, description: &str) -> UpsertScope {
    UpsertScope {
        id: id.into(),
        name: id.to_uppercase(),
        group: group.into(),
        description: description.into(),
    }
}

// ---------------------------------------------------------------------------
// Scope tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upsert_creates_then_updates_in_place() {
    let db = setup().await;
    let repo = SurrealScopeRepository::new(db);

    let created = repo
        .upsert(scope("email", "profile", "Read your email address"))
        .await
        .unwrap();
    assert_eq!(created.id, "email");
    assert_eq!(created.group, "profile");

    let updated = repo
        .upsert(scope("email", "contact", "Read your primary email"))
        .await
        .unwrap();
    assert_eq!(updated.id, "email");
    assert_eq!(updated.group, "contact");
    assert!(updated.updated_at >= created.updated_at);

    let fetched = repo.get_by_ids(&["email".to_string()]).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].description, "Read your primary email");
}

#[tokio::test]
async fn unknown_scope_ids_are_omitted() {
    let db = setup().await;
    let repo = SurrealScopeRepository::new(db);

    repo.upsert(scope("openid", "identity", "Sign you in"))
        .await
        .unwrap();

    let fetched = repo
        .get_by_ids(&["openid".to_string(), "unknown-id".to_string()])
        .await
        .unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, "openid");

    assert!(repo.get_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn group_upsert_and_lookup() {
    let db = setup().await;
    let repo = SurrealScopeRepository::new(db);

    repo.upsert_group(UpdateScopeGroup {
        name: "profile".into(),
        description: "Your profile".into(),
    })
    .await
    .unwrap();
    let updated = repo
        .upsert_group(UpdateScopeGroup {
            name: "profile".into(),
            description: "Your public profile".into(),
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "profile");
    assert_eq!(updated.description, "Your public profile");

    let groups = repo
        .get_groups(&["profile".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].description, "Your public profile");
}

// ---------------------------------------------------------------------------
// Consent tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn consent_grants_are_append_only_history() {
    let db = setup().await;
    let repo = SurrealConsentRepository::new(db);
    let user_id = Uuid::new_v4();
    let owner_id = Uuid::new_v4();

    let first = repo
        .append(CreateConsentGrant {
            user_id,
            client_id: "dashboard".into(),
            owner_id,
            scopes: vec!["openid".into(), "email".into(), "openid".into()],
        })
        .await
        .unwrap();
    assert_eq!(first.scopes, vec!["openid".to_string(), "email".to_string()]);

    let second = repo
        .append(CreateConsentGrant {
            user_id,
            client_id: "dashboard".into(),
            owner_id,
            scopes: vec!["openid".into()],
        })
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let latest = repo.latest(user_id, "dashboard").await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.scopes, vec!["openid".to_string()]);

    assert!(repo.latest(user_id, "other-client").await.unwrap().is_none());
}

//! Tollgate schema and its versioned migrations.
//!
//! Tables are SCHEMAFULL. IDs are UUID strings and environments are
//! strings constrained with ASSERT. Every uniqueness rule the engine relies
//! on is a UNIQUE index here.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Organizations
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD contact_email ON TABLE organization TYPE string;
DEFINE FIELD contact_phone ON TABLE organization TYPE option<string>;
DEFINE FIELD activated ON TABLE organization TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Roles (organization scope)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD org_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string;
DEFINE FIELD creator_id ON TABLE role TYPE string;
DEFINE FIELD members ON TABLE role TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
-- Also guarantees a single reserved Owner role per organization.
DEFINE INDEX idx_role_org_name ON TABLE role \
    COLUMNS org_id, name UNIQUE;

-- =======================================================================
-- Role grants (record ID derived from role_id, grant_id, environment)
-- =======================================================================
DEFINE TABLE role_grant SCHEMAFULL;
DEFINE FIELD role_id ON TABLE role_grant TYPE string;
DEFINE FIELD grant_id ON TABLE role_grant TYPE string;
DEFINE FIELD environment ON TABLE role_grant TYPE string \
    ASSERT $value IN ['Production', 'Sandbox'];
DEFINE FIELD is_default ON TABLE role_grant TYPE bool DEFAULT false;
DEFINE FIELD assigned_by ON TABLE role_grant TYPE option<string>;
DEFINE FIELD created_at ON TABLE role_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_grant_tuple ON TABLE role_grant \
    COLUMNS role_id, grant_id, environment UNIQUE;

-- =======================================================================
-- Organization permissions
-- =======================================================================
DEFINE TABLE org_permission SCHEMAFULL;
DEFINE FIELD org_id ON TABLE org_permission TYPE string;
DEFINE FIELD resource ON TABLE org_permission TYPE string;
DEFINE FIELD action ON TABLE org_permission TYPE string;
DEFINE FIELD allow ON TABLE org_permission TYPE bool DEFAULT true;
DEFINE FIELD environment ON TABLE org_permission TYPE string \
    ASSERT $value IN ['Production', 'Sandbox'];
DEFINE FIELD groups ON TABLE org_permission TYPE array<string> \
    DEFAULT [];
DEFINE FIELD users ON TABLE org_permission TYPE array<string> \
    DEFAULT [];
DEFINE FIELD is_default ON TABLE org_permission TYPE bool \
    DEFAULT false;
DEFINE FIELD created_at ON TABLE org_permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE org_permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_org_permission_tuple ON TABLE org_permission \
    COLUMNS org_id, resource, action, environment UNIQUE;

-- =======================================================================
-- Scopes and scope groups (record ID is the scope ID / group name)
-- =======================================================================
DEFINE TABLE scope SCHEMAFULL;
DEFINE FIELD name ON TABLE scope TYPE string;
DEFINE FIELD group_name ON TABLE scope TYPE string;
DEFINE FIELD description ON TABLE scope TYPE string;
DEFINE FIELD updated_at ON TABLE scope TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_scope_group ON TABLE scope COLUMNS group_name;

DEFINE TABLE scope_group SCHEMAFULL;
DEFINE FIELD description ON TABLE scope_group TYPE string;
DEFINE FIELD updated_at ON TABLE scope_group TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Consent grants (append-only)
-- =======================================================================
DEFINE TABLE consent_grant SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD user_id ON TABLE consent_grant TYPE string;
DEFINE FIELD client_id ON TABLE consent_grant TYPE string;
DEFINE FIELD owner_id ON TABLE consent_grant TYPE string;
DEFINE FIELD scopes ON TABLE consent_grant TYPE array<string>;
DEFINE FIELD granted_at ON TABLE consent_grant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_consent_user_client ON TABLE consent_grant \
    COLUMNS user_id, client_id;
";

/// Bring the database up to the latest schema version.
///
/// Versions are tracked in `_migration`; only versions above the highest
/// recorded one are applied, in order. Safe to call on every startup.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("tracking table: {e}")))?;

    let applied = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        info!(version = applied, "Schema up to date");
        return Ok(());
    }
    for migration in pending {
        apply(db, migration).await?;
    }
    Ok(())
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.into_iter().map(|r| r.version).max().unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(version = migration.version, name = migration.name, "Applying schema migration");
    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| migration_error(migration, "failed", e))?;
    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| migration_error(migration, "could not be recorded", e))?;
    info!(version = migration.version, "Schema migration recorded");
    Ok(())
}

fn migration_error(migration: &Migration, stage: &str, e: impl std::fmt::Display) -> DbError {
    DbError::Migration(format!(
        "v{} ({}) {stage}: {e}",
        migration.version, migration.name
    ))
}

/// DDL of the first schema version, for tests that load it directly.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

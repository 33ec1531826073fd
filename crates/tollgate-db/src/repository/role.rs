//! SurrealDB implementation of [`RoleRepository`].
//!
//! Grants live in the `role_grant` table. Each record ID is derived from the
//! (role, grant, environment) tuple, so the record key itself enforces tuple
//! uniqueness alongside the `idx_role_grant_tuple` index.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tollgate_core::error::TollgateResult;
use tollgate_core::models::grant::{Environment, NewGrant, RoleGrant};
use tollgate_core::models::role::{
    CreateRole, Role, RoleFilter, RoleSort, RoleSortKey, SortDirection,
};
use tollgate_core::repository::{PaginatedResult, Pagination, RoleRepository};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct RoleRow {
    org_id: String,
    name: String,
    description: String,
    creator_id: String,
    members: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    org_id: String,
    name: String,
    description: String,
    creator_id: String,
    members: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid, grant_ids: Vec<Uuid>) -> Result<Role, DbError> {
        Ok(Role {
            id,
            org_id: parse_uuid("org", &self.org_id)?,
            name: self.name,
            description: self.description,
            creator_id: parse_uuid("creator", &self.creator_id)?,
            members: parse_members(&self.members)?,
            grant_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl RoleRowWithId {
    fn try_into_role(self, grant_ids: Vec<Uuid>) -> Result<Role, DbError> {
        let id = parse_uuid("role", &self.record_id)?;
        RoleRow {
            org_id: self.org_id,
            name: self.name,
            description: self.description,
            creator_id: self.creator_id,
            members: self.members,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_role(id, grant_ids)
    }
}

fn parse_members(members: &[String]) -> Result<Vec<Uuid>, DbError> {
    members.iter().map(|m| parse_uuid("member", m)).collect()
}

#[derive(Debug, SurrealValue)]
struct RoleGrantRow {
    role_id: String,
    grant_id: String,
    environment: String,
    is_default: bool,
    assigned_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl RoleGrantRow {
    fn into_grant(self, id: Uuid) -> Result<RoleGrant, DbError> {
        Ok(RoleGrant {
            id,
            role_id: parse_uuid("role", &self.role_id)?,
            grant_id: parse_uuid("grant", &self.grant_id)?,
            environment: parse_environment(&self.environment)?,
            is_default: self.is_default,
            assigned_by: self
                .assigned_by
                .as_deref()
                .map(|a| parse_uuid("assigned_by", a))
                .transpose()?,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoleGrantRowWithId {
    record_id: String,
    role_id: String,
    grant_id: String,
    environment: String,
    is_default: bool,
    assigned_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl RoleGrantRowWithId {
    fn try_into_grant(self) -> Result<RoleGrant, DbError> {
        let id = parse_uuid("grant record", &self.record_id)?;
        RoleGrantRow {
            role_id: self.role_id,
            grant_id: self.grant_id,
            environment: self.environment,
            is_default: self.is_default,
            assigned_by: self.assigned_by,
            created_at: self.created_at,
        }
        .into_grant(id)
    }
}

/// Minimal projection used to attach grant IDs to listed roles.
#[derive(Debug, SurrealValue)]
struct GrantRefRow {
    role_id: String,
    grant_id: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

pub(crate) fn parse_environment(s: &str) -> Result<Environment, DbError> {
    s.parse()
        .map_err(|_| DbError::Decode(format!("unknown environment: {s}")))
}

/// Group grant references by role, keeping distinct grant IDs in the order
/// they were first seen.
fn grant_ids_by_role(rows: Vec<GrantRefRow>) -> Result<HashMap<String, Vec<Uuid>>, DbError> {
    let mut by_role: HashMap<String, Vec<Uuid>> = HashMap::new();
    let mut seen = HashSet::new();
    for row in rows {
        let grant_id = parse_uuid("grant", &row.grant_id)?;
        if seen.insert((row.role_id.clone(), grant_id)) {
            by_role.entry(row.role_id).or_default().push(grant_id);
        }
    }
    Ok(by_role)
}

fn order_clause(sort: RoleSort) -> &'static str {
    match (sort.key, sort.direction) {
        (RoleSortKey::CreatedAt, SortDirection::Ascending) => "ORDER BY created_at ASC",
        (RoleSortKey::CreatedAt, SortDirection::Descending) => "ORDER BY created_at DESC",
        (RoleSortKey::UpdatedAt, SortDirection::Ascending) => "ORDER BY updated_at ASC",
        (RoleSortKey::UpdatedAt, SortDirection::Descending) => "ORDER BY updated_at DESC",
        (RoleSortKey::Name, SortDirection::Ascending) => "ORDER BY name ASC",
        (RoleSortKey::Name, SortDirection::Descending) => "ORDER BY name DESC",
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_grant(&self, record_id: Uuid) -> Result<Option<RoleGrant>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('role_grant', $id)")
            .bind(("id", record_id.to_string()))
            .await?;

        let rows: Vec<RoleGrantRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.into_grant(record_id))
            .transpose()
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> TollgateResult<Role> {
        let id = Uuid::new_v4();
        let org_id_str = input.org_id.to_string();

        // Report a clean Conflict for the common case; the unique index on
        // (org_id, name) still catches concurrent writers.
        let mut existing = self
            .db
            .query(
                "SELECT count() AS total FROM role \
                 WHERE org_id = $org_id AND name = $name GROUP ALL",
            )
            .bind(("org_id", org_id_str.clone()))
            .bind(("name", input.name.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = existing.take(0).map_err(DbError::from)?;
        if count_rows.first().map(|r| r.total).unwrap_or(0) > 0 {
            return Err(DbError::Conflict {
                entity: "role".into(),
            }
            .into());
        }

        let members: Vec<String> = input.members.iter().map(Uuid::to_string).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 org_id = $org_id, name = $name, \
                 description = $description, creator_id = $creator_id, \
                 members = $members",
            )
            .bind(("id", id.to_string()))
            .bind(("org_id", org_id_str))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("creator_id", input.creator_id.to_string()))
            .bind(("members", members))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_role(id, Vec::new())?)
    }

    async fn get_by_id(&self, id: Uuid) -> TollgateResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id); \
                 SELECT role_id, grant_id, created_at FROM role_grant \
                 WHERE role_id = $id ORDER BY created_at ASC;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let grants: Vec<GrantRefRow> = result.take(1).map_err(DbError::from)?;

        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str.clone(),
        })?;

        let grant_ids = grant_ids_by_role(grants)?
            .remove(&id_str)
            .unwrap_or_default();

        Ok(row.into_role(id, grant_ids)?)
    }

    async fn list(
        &self,
        filter: RoleFilter,
        sort: RoleSort,
        pagination: Pagination,
    ) -> TollgateResult<PaginatedResult<Role>> {
        if filter.ids.as_ref().is_some_and(Vec::is_empty) {
            return Ok(PaginatedResult {
                items: Vec::new(),
                total: 0,
                offset: pagination.offset,
                limit: pagination.limit,
            });
        }

        let mut conditions = Vec::new();
        if filter.ids.is_some() {
            conditions.push("meta::id(id) INSIDE $ids");
        }
        if filter.org_id.is_some() {
            conditions.push("org_id = $org_id");
        }
        if filter.name.is_some() {
            conditions.push("string::contains(string::lowercase(name), $name)");
        }
        if filter.member_id.is_some() {
            conditions.push("$member_id INSIDE members");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT count() AS total FROM role {where_clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM role {where_clause} \
             {} LIMIT $limit START $offset;",
            order_clause(sort)
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        if let Some(ids) = filter.ids {
            let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
            builder = builder.bind(("ids", ids));
        }
        if let Some(org_id) = filter.org_id {
            builder = builder.bind(("org_id", org_id.to_string()));
        }
        if let Some(name) = filter.name {
            builder = builder.bind(("name", name.to_lowercase()));
        }
        if let Some(member_id) = filter.member_id {
            builder = builder.bind(("member_id", member_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);
        let rows: Vec<RoleRowWithId> = result.take(1).map_err(DbError::from)?;

        let role_ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let mut grants = if role_ids.is_empty() {
            HashMap::new()
        } else {
            let mut grant_result = self
                .db
                .query(
                    "SELECT role_id, grant_id, created_at FROM role_grant \
                     WHERE role_id INSIDE $role_ids ORDER BY created_at ASC",
                )
                .bind(("role_ids", role_ids))
                .await
                .map_err(DbError::from)?;
            let refs: Vec<GrantRefRow> = grant_result.take(0).map_err(DbError::from)?;
            grant_ids_by_role(refs)?
        };

        let items = rows
            .into_iter()
            .map(|row| {
                let grant_ids = grants.remove(&row.record_id).unwrap_or_default();
                row.try_into_role(grant_ids)
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn grant(&self, grant: NewGrant, assigned_by: Option<Uuid>) -> TollgateResult<RoleGrant> {
        let record_id = grant.record_id();

        if let Some(existing) = self.find_grant(record_id).await? {
            debug!(grant_record = %record_id, "Grant already present");
            return Ok(existing);
        }

        let result = self
            .db
            .query(
                "CREATE type::record('role_grant', $id) SET \
                 role_id = $role_id, grant_id = $grant_id, \
                 environment = $environment, is_default = $is_default, \
                 assigned_by = $assigned_by",
            )
            .bind(("id", record_id.to_string()))
            .bind(("role_id", grant.role_id.to_string()))
            .bind(("grant_id", grant.grant_id.to_string()))
            .bind(("environment", grant.environment.as_str()))
            .bind(("is_default", grant.is_default))
            .bind(("assigned_by", assigned_by.map(|a| a.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(result) => result,
            Err(e) => {
                return match DbError::statement("role_grant", e) {
                    // A concurrent writer created the same tuple first.
                    DbError::Conflict { .. } => match self.find_grant(record_id).await? {
                        Some(existing) => Ok(existing),
                        None => Err(DbError::Conflict {
                            entity: "role_grant".into(),
                        }
                        .into()),
                    },
                    other => Err(other.into()),
                };
            }
        };

        let rows: Vec<RoleGrantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role_grant".into(),
            id: record_id.to_string(),
        })?;

        Ok(row.into_grant(record_id)?)
    }

    async fn get_grants(&self, role_id: Uuid) -> TollgateResult<Vec<RoleGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role_grant \
                 WHERE role_id = $role_id ORDER BY created_at ASC",
            )
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleGrantRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_grant())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}

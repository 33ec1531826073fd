//! SurrealDB implementation of [`OrgPermissionRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tollgate_core::error::TollgateResult;
use tollgate_core::models::permission::{CreateOrgPermission, OrgPermission};
use tollgate_core::repository::OrgPermissionRepository;
use uuid::Uuid;

use super::role::parse_environment;
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct OrgPermissionRow {
    org_id: String,
    resource: String,
    action: String,
    allow: bool,
    environment: String,
    groups: Vec<String>,
    users: Vec<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrgPermissionRow {
    fn into_permission(self, id: Uuid) -> Result<OrgPermission, DbError> {
        Ok(OrgPermission {
            id,
            org_id: parse_uuid("org", &self.org_id)?,
            resource: self.resource,
            action: self.action,
            allow: self.allow,
            environment: parse_environment(&self.environment)?,
            groups: self.groups,
            users: self
                .users
                .iter()
                .map(|u| parse_uuid("user", u))
                .collect::<Result<Vec<_>, _>>()?,
            is_default: self.is_default,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct OrgPermissionRowWithId {
    record_id: String,
    org_id: String,
    resource: String,
    action: String,
    allow: bool,
    environment: String,
    groups: Vec<String>,
    users: Vec<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrgPermissionRowWithId {
    fn try_into_permission(self) -> Result<OrgPermission, DbError> {
        let id = parse_uuid("permission", &self.record_id)?;
        OrgPermissionRow {
            org_id: self.org_id,
            resource: self.resource,
            action: self.action,
            allow: self.allow,
            environment: self.environment,
            groups: self.groups,
            users: self.users,
            is_default: self.is_default,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_permission(id)
    }
}

/// SurrealDB implementation of the OrgPermission repository.
#[derive(Clone)]
pub struct SurrealOrgPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrgPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(&self, input: &CreateOrgPermission) -> Result<Option<OrgPermission>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM org_permission \
                 WHERE org_id = $org_id AND resource = $resource \
                 AND action = $action AND environment = $environment",
            )
            .bind(("org_id", input.org_id.to_string()))
            .bind(("resource", input.resource.clone()))
            .bind(("action", input.action.clone()))
            .bind(("environment", input.environment.as_str()))
            .await?;

        let rows: Vec<OrgPermissionRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(OrgPermissionRowWithId::try_into_permission)
            .transpose()
    }
}

impl<C: Connection> OrgPermissionRepository for SurrealOrgPermissionRepository<C> {
    async fn create(&self, input: CreateOrgPermission) -> TollgateResult<OrgPermission> {
        if let Some(existing) = self.find(&input).await? {
            return Ok(existing);
        }

        let id = Uuid::new_v4();
        let users: Vec<String> = input.users.iter().map(Uuid::to_string).collect();

        let result = self
            .db
            .query(
                "CREATE type::record('org_permission', $id) SET \
                 org_id = $org_id, resource = $resource, action = $action, \
                 allow = $allow, environment = $environment, \
                 groups = $groups, users = $users, is_default = $is_default",
            )
            .bind(("id", id.to_string()))
            .bind(("org_id", input.org_id.to_string()))
            .bind(("resource", input.resource.clone()))
            .bind(("action", input.action.clone()))
            .bind(("allow", input.allow))
            .bind(("environment", input.environment.as_str()))
            .bind(("groups", input.groups.clone()))
            .bind(("users", users))
            .bind(("is_default", input.is_default))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(result) => result,
            Err(e) => {
                return match DbError::statement("org_permission", e) {
                    DbError::Conflict { .. } => self
                        .find(&input)
                        .await?
                        .ok_or_else(|| {
                            DbError::Conflict {
                                entity: "org_permission".into(),
                            }
                            .into()
                        }),
                    other => Err(other.into()),
                };
            }
        };

        let rows: Vec<OrgPermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "org_permission".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_permission(id)?)
    }

    async fn list(&self, org_id: Uuid, defaults_only: bool) -> TollgateResult<Vec<OrgPermission>> {
        let query = if defaults_only {
            "SELECT meta::id(id) AS record_id, * FROM org_permission \
             WHERE org_id = $org_id AND is_default = true \
             ORDER BY created_at ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM org_permission \
             WHERE org_id = $org_id ORDER BY created_at ASC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("org_id", org_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrgPermissionRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}

//! SurrealDB implementation of [`ScopeRepository`].
//!
//! Scope records are keyed by the scope ID and group records by the group
//! name, so `UPSERT` on the record key is idempotent by construction.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tollgate_core::error::TollgateResult;
use tollgate_core::models::scope::{Scope, ScopeGroupInfo, UpdateScopeGroup, UpsertScope};
use tollgate_core::repository::ScopeRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ScopeRow {
    name: String,
    group_name: String,
    description: String,
    updated_at: DateTime<Utc>,
}

impl ScopeRow {
    fn into_scope(self, id: String) -> Scope {
        Scope {
            id,
            name: self.name,
            group: self.group_name,
            description: self.description,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct ScopeRowWithId {
    record_id: String,
    name: String,
    group_name: String,
    description: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ScopeGroupRow {
    description: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct ScopeGroupRowWithId {
    record_id: String,
    description: String,
    updated_at: DateTime<Utc>,
}

/// SurrealDB implementation of the Scope repository.
#[derive(Clone)]
pub struct SurrealScopeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealScopeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ScopeRepository for SurrealScopeRepository<C> {
    async fn upsert(&self, input: UpsertScope) -> TollgateResult<Scope> {
        let result = self
            .db
            .query(
                "UPSERT type::record('scope', $id) SET \
                 name = $name, group_name = $group_name, \
                 description = $description, updated_at = time::now()",
            )
            .bind(("id", input.id.clone()))
            .bind(("name", input.name))
            .bind(("group_name", input.group))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("scope", e))?;

        let rows: Vec<ScopeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "scope".into(),
            id: input.id.clone(),
        })?;

        Ok(row.into_scope(input.id))
    }

    async fn upsert_group(&self, input: UpdateScopeGroup) -> TollgateResult<ScopeGroupInfo> {
        let result = self
            .db
            .query(
                "UPSERT type::record('scope_group', $name) SET \
                 description = $description, updated_at = time::now()",
            )
            .bind(("name", input.name.clone()))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("scope_group", e))?;

        let rows: Vec<ScopeGroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "scope_group".into(),
            id: input.name.clone(),
        })?;

        Ok(ScopeGroupInfo {
            name: input.name,
            description: row.description,
            updated_at: row.updated_at,
        })
    }

    async fn get_by_ids(&self, ids: &[String]) -> TollgateResult<Vec<Scope>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scope \
                 WHERE meta::id(id) INSIDE $ids",
            )
            .bind(("ids", ids.to_vec()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut scopes: Vec<Scope> = rows
            .into_iter()
            .map(|row| {
                ScopeRow {
                    name: row.name,
                    group_name: row.group_name,
                    description: row.description,
                    updated_at: row.updated_at,
                }
                .into_scope(row.record_id)
            })
            .collect();
        scopes.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(scopes)
    }

    async fn get_groups(&self, names: &[String]) -> TollgateResult<Vec<ScopeGroupInfo>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scope_group \
                 WHERE meta::id(id) INSIDE $names",
            )
            .bind(("names", names.to_vec()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScopeGroupRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| ScopeGroupInfo {
                name: row.record_id,
                description: row.description,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

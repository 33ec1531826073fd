//! SurrealDB implementation of [`ConsentRepository`].
//!
//! The `consent_grant` table is append-only: records are created and read,
//! never updated or deleted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tollgate_core::error::TollgateResult;
use tollgate_core::models::consent::{ConsentGrant, CreateConsentGrant};
use tollgate_core::repository::ConsentRepository;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ConsentGrantRow {
    user_id: String,
    client_id: String,
    owner_id: String,
    scopes: Vec<String>,
    granted_at: DateTime<Utc>,
}

impl ConsentGrantRow {
    fn into_grant(self, id: Uuid) -> Result<ConsentGrant, DbError> {
        Ok(ConsentGrant {
            id,
            user_id: parse_uuid("user", &self.user_id)?,
            client_id: self.client_id,
            owner_id: parse_uuid("owner", &self.owner_id)?,
            scopes: self.scopes,
            granted_at: self.granted_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct ConsentGrantRowWithId {
    record_id: String,
    user_id: String,
    client_id: String,
    owner_id: String,
    scopes: Vec<String>,
    granted_at: DateTime<Utc>,
}

fn dedup_scopes(scopes: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    scopes
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// SurrealDB implementation of the consent history repository.
#[derive(Clone)]
pub struct SurrealConsentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealConsentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ConsentRepository for SurrealConsentRepository<C> {
    async fn append(&self, input: CreateConsentGrant) -> TollgateResult<ConsentGrant> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('consent_grant', $id) SET \
                 user_id = $user_id, client_id = $client_id, \
                 owner_id = $owner_id, scopes = $scopes",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("client_id", input.client_id))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("scopes", dedup_scopes(input.scopes)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("consent_grant", e))?;

        let rows: Vec<ConsentGrantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "consent_grant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_grant(id)?)
    }

    async fn latest(&self, user_id: Uuid, client_id: &str) -> TollgateResult<Option<ConsentGrant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM consent_grant \
                 WHERE user_id = $user_id AND client_id = $client_id \
                 ORDER BY granted_at DESC LIMIT 1",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("client_id", client_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ConsentGrantRowWithId> = result.take(0).map_err(DbError::from)?;

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let id = parse_uuid("consent grant", &row.record_id)?;
        let grant = ConsentGrantRow {
            user_id: row.user_id,
            client_id: row.client_id,
            owner_id: row.owner_id,
            scopes: row.scopes,
            granted_at: row.granted_at,
        }
        .into_grant(id)?;

        Ok(Some(grant))
    }
}

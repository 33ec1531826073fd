//! SurrealDB implementation of [`OrganizationRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tollgate_core::error::TollgateResult;
use tollgate_core::models::organization::{
    CreateOrganization, Organization, UpdateOrganization,
};
use tollgate_core::repository::OrganizationRepository;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    name: String,
    contact_email: String,
    contact_phone: Option<String>,
    activated: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn into_organization(self, id: Uuid) -> Organization {
        Organization {
            id,
            name: self.name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            activated: self.activated,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn first_row(rows: Vec<OrganizationRow>, id: Uuid) -> Result<Organization, DbError> {
    rows.into_iter()
        .next()
        .map(|row| row.into_organization(id))
        .ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id.to_string(),
        })
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> TollgateResult<Organization> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('organization', $id) SET \
                 name = $name, contact_email = $contact_email, \
                 contact_phone = $contact_phone, activated = false",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("contact_email", input.contact_email))
            .bind(("contact_phone", input.contact_phone))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("organization", e))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TollgateResult<Organization> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('organization', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> TollgateResult<Organization> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.contact_email.is_some() {
            sets.push("contact_email = $contact_email");
        }
        if input.contact_phone.is_some() {
            sets.push("contact_phone = $contact_phone");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('organization', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(contact_email) = input.contact_email {
            builder = builder.bind(("contact_email", contact_email));
        }
        if let Some(contact_phone) = input.contact_phone {
            builder = builder.bind(("contact_phone", contact_phone));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("organization", e))?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }

    async fn activate(&self, id: Uuid) -> TollgateResult<Organization> {
        // The first statement only touches inactive organizations, so
        // repeated activation leaves the record (and updated_at) alone.
        let result = self
            .db
            .query(
                "UPDATE type::record('organization', $id) SET \
                 activated = true, updated_at = time::now() \
                 WHERE activated = false; \
                 SELECT * FROM type::record('organization', $id);",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("organization", e))?;

        let rows: Vec<OrganizationRow> = result.take(1).map_err(DbError::from)?;
        Ok(first_row(rows, id)?)
    }
}

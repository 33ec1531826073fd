//! Organization permission domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grant::Environment;

/// A concrete permission owned by an organization. Grants reference
/// permissions by ID; a permission is never duplicated per
/// (organization, resource, action, environment).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgPermission {
    pub id: Uuid,
    pub org_id: Uuid,
    /// The protected resource (e.g., `billing:invoices`).
    pub resource: String,
    /// The action on the resource (e.g., `read`, `write`).
    pub action: String,
    /// `false` makes this an explicit deny.
    pub allow: bool,
    pub environment: Environment,
    pub groups: Vec<String>,
    pub users: Vec<Uuid>,
    /// Default permissions are granted to the Owner role on activation.
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrgPermission {
    pub org_id: Uuid,
    pub resource: String,
    pub action: String,
    pub allow: bool,
    pub environment: Environment,
    pub groups: Vec<String>,
    pub users: Vec<Uuid>,
    pub is_default: bool,
}

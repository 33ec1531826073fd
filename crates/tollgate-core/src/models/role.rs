//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the reserved role created by organization bootstrap.
pub const OWNER_ROLE_NAME: &str = "Owner";

/// The unit to which permissions and service grants are attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    /// Member user IDs in insertion order.
    pub members: Vec<Uuid>,
    /// Distinct grant IDs attached to this role, across all environments.
    pub grant_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn is_owner(&self) -> bool {
        self.name == OWNER_ROLE_NAME
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub org_id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub members: Vec<Uuid>,
}

/// Filters for [`crate::repository::RoleRepository::list`]. Every populated
/// field narrows the result; an empty filter matches every role.
#[derive(Debug, Clone, Default)]
pub struct RoleFilter {
    pub ids: Option<Vec<Uuid>>,
    pub org_id: Option<Uuid>,
    /// Case-insensitive substring match on the role name.
    pub name: Option<String>,
    /// Only roles that list this user among their members.
    pub member_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoleSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoleSort {
    pub key: RoleSortKey,
    pub direction: SortDirection,
}

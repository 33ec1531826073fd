//! Scope domain model.
//!
//! Scopes are the consent units a client application can request. Each
//! scope belongs to exactly one [`ScopeGroup`], which consent screens use
//! to render related scopes together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Immutable identifier (e.g., `openid`, `billing.read`).
    pub id: String,
    pub name: String,
    /// Name of the owning [`ScopeGroup`].
    pub group: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or updating a scope by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertScope {
    pub id: String,
    pub name: String,
    pub group: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeGroup {
    pub name: String,
    pub description: String,
    /// Scopes ordered by ID.
    pub scopes: Vec<Scope>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating or updating a group's description by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScopeGroup {
    pub name: String,
    pub description: String,
}

/// Stored group metadata without its scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeGroupInfo {
    pub name: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

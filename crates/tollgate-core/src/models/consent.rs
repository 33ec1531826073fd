//! Consent domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::scope::ScopeGroup;

/// An immutable record of a finalized consent decision. Later grants for the
/// same (user, client) pair supersede earlier ones; nothing is overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: String,
    /// Organization that owns the client.
    pub owner_id: Uuid,
    pub scopes: Vec<String>,
    pub granted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConsentGrant {
    pub user_id: Uuid,
    pub client_id: String,
    pub owner_id: Uuid,
    pub scopes: Vec<String>,
}

/// What a consent screen needs to render: the client owner's identity,
/// whether interaction can be skipped, and the requested scopes split into
/// already granted and new, keyed by group name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferGrant {
    pub org_id: Uuid,
    pub org_name: String,
    pub skip: bool,
    pub new_scopes: BTreeMap<String, ScopeGroup>,
    pub granted_scopes: BTreeMap<String, ScopeGroup>,
    /// Group name to group description, for every group in either map.
    pub groups: BTreeMap<String, String>,
}

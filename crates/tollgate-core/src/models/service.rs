//! Integrated service catalog entries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grant::Environment;

/// Namespace for deriving service IDs from service keys.
const SERVICE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x2d94_81f3_77a0_4b1e_8c65_e4f0_1a3b_9d27);

/// A permission a service offers to organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePermission {
    pub resource: String,
    pub action: String,
    #[serde(default = "default_true")]
    pub allow: bool,
    #[serde(default)]
    pub description: String,
    /// Exposed as a default OrgPermission (granted to Owner on activation).
    #[serde(default = "default_true")]
    pub is_default: bool,
}

/// A service integrated with the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique registration key (e.g., `billing`).
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Environments the service is offered in.
    pub environments: Vec<Environment>,
    /// Granted to every organization's baseline role on activation.
    #[serde(default)]
    pub default_grant: bool,
    #[serde(default)]
    pub permissions: Vec<ServicePermission>,
}

impl Service {
    /// Stable ID derived from the registration key.
    pub fn id(&self) -> Uuid {
        service_id(&self.key)
    }
}

pub fn service_id(key: &str) -> Uuid {
    Uuid::new_v5(&SERVICE_ID_NAMESPACE, key.as_bytes())
}

fn default_true() -> bool {
    true
}

//! Grant domain model: a permission or service entitlement attached to a
//! role within a deployment environment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TollgateError;

/// Deployment environment a grant or permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Environment {
    Production,
    Sandbox,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Production, Environment::Sandbox];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "Production",
            Environment::Sandbox => "Sandbox",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = TollgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Production" => Ok(Environment::Production),
            "Sandbox" => Ok(Environment::Sandbox),
            other => Err(TollgateError::invalid(format!(
                "unknown environment: {other}"
            ))),
        }
    }
}

/// Namespace for deriving grant record IDs from the grant tuple.
const GRANT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_5a0e_2b7d_4c39_9e51_0d8a_3f42_b7c6);

/// Request to attach `grant_id` to `role_id` in `environment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGrant {
    pub role_id: Uuid,
    pub grant_id: Uuid,
    pub environment: Environment,
    pub is_default: bool,
}

impl NewGrant {
    /// Deterministic record ID for this (role, grant, environment) tuple.
    /// Two requests for the same tuple always map to the same record.
    pub fn record_id(&self) -> Uuid {
        let key = format!("{}/{}/{}", self.role_id, self.grant_id, self.environment);
        Uuid::new_v5(&GRANT_ID_NAMESPACE, key.as_bytes())
    }
}

/// A stored grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleGrant {
    pub id: Uuid,
    pub role_id: Uuid,
    pub grant_id: Uuid,
    pub environment: Environment,
    pub is_default: bool,
    /// User that assigned the grant, when it was made on someone's behalf.
    pub assigned_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_stable_per_tuple() {
        let grant = NewGrant {
            role_id: Uuid::new_v4(),
            grant_id: Uuid::new_v4(),
            environment: Environment::Production,
            is_default: false,
        };
        let again = NewGrant {
            is_default: true,
            ..grant.clone()
        };
        assert_eq!(grant.record_id(), again.record_id());

        let sandbox = NewGrant {
            environment: Environment::Sandbox,
            ..grant.clone()
        };
        assert_ne!(grant.record_id(), sandbox.record_id());
    }

    #[test]
    fn environment_parses_its_own_names() {
        for env in Environment::ALL {
            assert_eq!(env.as_str().parse::<Environment>().unwrap(), env);
        }
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn environment_serializes_as_stored() {
        assert_eq!(
            serde_json::to_string(&Environment::Sandbox).unwrap(),
            "\"Sandbox\""
        );
    }
}

//! Consent negotiation between a user, a client application and the scopes
//! it requests.

use std::collections::{BTreeMap, HashSet};

use tollgate_core::error::TollgateResult;
use tollgate_core::models::consent::{ConsentGrant, CreateConsentGrant, OfferGrant};
use tollgate_core::models::scope::{Scope, ScopeGroup};
use tollgate_core::repository::{ConsentRepository, OrganizationRepository, ScopeRepository};
use tollgate_core::validation;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AuthzConfig;
use crate::guard::StorageGuard;
use crate::scope_registry::ScopeRegistry;

/// Scopes a client asks for, next to what the user granted it before.
#[derive(Debug, Clone, Default)]
pub struct ConsentRequest {
    pub user_id: Uuid,
    pub client_id: String,
    /// Organization that owns the client.
    pub owner_id: Uuid,
    pub requested: Vec<String>,
    pub granted: Vec<String>,
}

pub struct ConsentNegotiator<S, C, O>
where
    S: ScopeRepository,
    C: ConsentRepository,
    O: OrganizationRepository,
{
    scopes: ScopeRegistry<S>,
    consent_repo: C,
    org_repo: O,
    storage: StorageGuard,
}

impl<S, C, O> ConsentNegotiator<S, C, O>
where
    S: ScopeRepository,
    C: ConsentRepository,
    O: OrganizationRepository,
{
    pub fn new(scopes: ScopeRegistry<S>, consent_repo: C, org_repo: O, config: &AuthzConfig) -> Self {
        Self {
            scopes,
            consent_repo,
            org_repo,
            storage: StorageGuard::new(config.storage_timeout()),
        }
    }

    /// Build the consent offer for a request. Scopes in `granted` are
    /// reported as already granted, the rest of `requested` as new. IDs
    /// the registry does not know are dropped. Writes nothing.
    pub async fn serve_grant(&self, request: ConsentRequest) -> TollgateResult<OfferGrant> {
        validation::required_id("user_id", request.user_id)?;
        validation::required_id("owner_id", request.owner_id)?;
        validation::non_empty("client_id", &request.client_id)?;

        let org = self
            .storage
            .run(
                "serve_grant",
                request.owner_id,
                self.org_repo.get_by_id(request.owner_id),
            )
            .await?;

        let union: Vec<String> = request
            .requested
            .iter()
            .chain(&request.granted)
            .cloned()
            .collect();
        let resolved = self.scopes.get_scopes(&union).await?;

        let granted: HashSet<&str> = request.granted.iter().map(String::as_str).collect();

        let mut new_scopes = BTreeMap::new();
        let mut granted_scopes = BTreeMap::new();
        let mut groups = BTreeMap::new();
        for (name, group) in resolved {
            groups.insert(name.clone(), group.description.clone());
            let (old, new): (Vec<_>, Vec<_>) = group
                .scopes
                .iter()
                .cloned()
                .partition(|s| granted.contains(s.id.as_str()));
            if !old.is_empty() {
                granted_scopes.insert(name.clone(), with_scopes(&group, old));
            }
            if !new.is_empty() {
                new_scopes.insert(name, with_scopes(&group, new));
            }
        }

        let skip = new_scopes.is_empty();
        debug!(
            user_id = %request.user_id,
            client_id = %request.client_id,
            org_id = %org.id,
            new_groups = new_scopes.len(),
            granted_groups = granted_scopes.len(),
            skip,
            "Consent offer built"
        );
        Ok(OfferGrant {
            org_id: org.id,
            org_name: org.name,
            skip,
            new_scopes,
            granted_scopes,
            groups,
        })
    }

    /// Record the user's decision. Each call appends a new grant that
    /// supersedes earlier ones for the same (user, client).
    pub async fn grant(
        &self,
        user_id: Uuid,
        client_id: &str,
        owner_id: Uuid,
        scopes: Vec<String>,
    ) -> TollgateResult<ConsentGrant> {
        validation::required_id("user_id", user_id)?;
        validation::required_id("owner_id", owner_id)?;
        validation::non_empty("client_id", client_id)?;
        for id in &scopes {
            validation::scope_id(id)?;
        }

        let input = CreateConsentGrant {
            user_id,
            client_id: client_id.to_string(),
            owner_id,
            scopes,
        };
        let grant = self
            .storage
            .run("grant", user_id, self.consent_repo.append(input))
            .await?;
        info!(
            grant_id = %grant.id,
            user_id = %user_id,
            client_id = %grant.client_id,
            scopes = grant.scopes.len(),
            "Consent granted"
        );
        Ok(grant)
    }

    /// The grant currently in force for (user, client), if any.
    pub async fn latest_grant(
        &self,
        user_id: Uuid,
        client_id: &str,
    ) -> TollgateResult<Option<ConsentGrant>> {
        validation::required_id("user_id", user_id)?;
        validation::non_empty("client_id", client_id)?;
        self.storage
            .run(
                "latest_grant",
                user_id,
                self.consent_repo.latest(user_id, client_id),
            )
            .await
    }
}

fn with_scopes(group: &ScopeGroup, scopes: Vec<Scope>) -> ScopeGroup {
    ScopeGroup {
        name: group.name.clone(),
        description: group.description.clone(),
        scopes,
        updated_at: group.updated_at,
    }
}

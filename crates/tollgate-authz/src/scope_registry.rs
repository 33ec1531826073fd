//! Scope registry: the catalog of grantable scopes and their display groups.

use std::collections::{BTreeMap, BTreeSet};

use tollgate_core::error::TollgateResult;
use tollgate_core::models::scope::{Scope, ScopeGroup, ScopeGroupInfo, UpdateScopeGroup, UpsertScope};
use tollgate_core::repository::ScopeRepository;
use tollgate_core::validation;
use tracing::{debug, info};

use crate::config::AuthzConfig;
use crate::guard::StorageGuard;

pub struct ScopeRegistry<S: ScopeRepository> {
    scope_repo: S,
    storage: StorageGuard,
}

impl<S: ScopeRepository> ScopeRegistry<S> {
    pub fn new(scope_repo: S, config: &AuthzConfig) -> Self {
        Self {
            scope_repo,
            storage: StorageGuard::new(config.storage_timeout()),
        }
    }

    /// Create the scope if its ID is unseen, otherwise replace its name,
    /// group and description. A blank name falls back to the ID.
    pub async fn upsert_scope(&self, mut input: UpsertScope) -> TollgateResult<Scope> {
        validation::scope_id(&input.id)?;
        validation::group_name(&input.group)?;
        validation::non_empty("description", &input.description)?;
        if input.name.trim().is_empty() {
            input.name = input.id.clone();
        }

        let subject = input.id.clone();
        let scope = self
            .storage
            .run("upsert_scope", &subject, self.scope_repo.upsert(input))
            .await?;
        info!(scope_id = %scope.id, group = %scope.group, "Scope upserted");
        Ok(scope)
    }

    /// Create or update a group's description.
    pub async fn update_group(&self, input: UpdateScopeGroup) -> TollgateResult<ScopeGroupInfo> {
        validation::group_name(&input.name)?;
        validation::non_empty("description", &input.description)?;

        let subject = input.name.clone();
        let group = self
            .storage
            .run("update_group", &subject, self.scope_repo.upsert_group(input))
            .await?;
        info!(group = %group.name, "Scope group updated");
        Ok(group)
    }

    /// Resolve scope IDs into their groups. Only scopes that exist are
    /// returned; unknown IDs are dropped without error.
    pub async fn get_scopes(&self, ids: &[String]) -> TollgateResult<BTreeMap<String, ScopeGroup>> {
        for id in ids {
            validation::scope_id(id)?;
        }
        let ids: Vec<String> = ids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect();
        if ids.is_empty() {
            return Ok(BTreeMap::new());
        }

        let scopes = self
            .storage
            .run("get_scopes", ids.len(), self.scope_repo.get_by_ids(&ids))
            .await?;
        let names: Vec<String> = scopes
            .iter()
            .map(|s| s.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let infos = if names.is_empty() {
            Vec::new()
        } else {
            self.storage
                .run("get_scope_groups", names.len(), self.scope_repo.get_groups(&names))
                .await?
        };

        debug!(
            requested = ids.len(),
            found = scopes.len(),
            groups = infos.len(),
            "Scopes resolved"
        );
        Ok(group_scopes(scopes, &infos))
    }
}

/// Arrange scopes under their group. Groups without stored metadata get an
/// empty description and no timestamp.
pub(crate) fn group_scopes(
    scopes: Vec<Scope>,
    infos: &[ScopeGroupInfo],
) -> BTreeMap<String, ScopeGroup> {
    let mut groups: BTreeMap<String, ScopeGroup> = BTreeMap::new();
    for scope in scopes {
        groups
            .entry(scope.group.clone())
            .or_insert_with(|| {
                let info = infos.iter().find(|i| i.name == scope.group);
                ScopeGroup {
                    name: scope.group.clone(),
                    description: info.map(|i| i.description.clone()).unwrap_or_default(),
                    scopes: Vec::new(),
                    updated_at: info.map(|i| i.updated_at),
                }
            })
            .scopes
            .push(scope);
    }
    groups
}

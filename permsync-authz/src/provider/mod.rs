// SPDX-License-Identifier: MIT OR Apache-2.0

//! Permission provider for a single GitHub-shaped code host.
mod groups;

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use permsync_directory::{
    CollaboratorAffiliation, DirectoryClient, PAGE_SIZE, RepositoryAffiliation, Visibility,
};
use tracing::{debug, trace, warn};

use crate::cache::{Group, GroupCache};
use crate::config::ProviderConfig;
use crate::error::{EnumerationError, ProviderError};
use crate::paginate::for_each_page;
use crate::partial::Partial;
use crate::types::{
    Account, AccountId, CodeHost, ExternalRepository, ExternalUserPermissions, FetchPermsOptions,
    RepoId, SERVICE_TYPE_GITHUB, split_name_with_owner,
};

use groups::{repo_affiliated_groups, user_affiliated_groups};

/// OAuth scopes of which the base token needs one to list organization and team affiliations.
const ORG_SCOPES: [&str; 3] = ["read:org", "write:org", "admin:org"];

const MISSING_ORG_SCOPE: &str = "Scope `read:org`, `write:org`, or `admin:org` is required to \
    enable `groupsCacheTTL`, please provide a `token` with the required scopes or disable group \
    caching";

/// Ordered set of ids, remembering insertion order.
struct IdSet<T> {
    seen: HashSet<T>,
    ids: Vec<T>,
}

impl<T: Clone + Eq + Hash> IdSet<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
        }
    }

    fn insert(&mut self, id: T) {
        if self.seen.insert(id.clone()) {
            self.ids.push(id);
        }
    }

    fn extend<'a>(&mut self, ids: impl IntoIterator<Item = &'a T>)
    where
        T: 'a,
    {
        for id in ids {
            self.insert(id.clone());
        }
    }

    fn into_vec(self) -> Vec<T> {
        self.ids
    }
}

/// Writes a group back to the cache, merged into whatever is stored by now.
///
/// Fields known in `group` replace the stored ones, unknown fields keep the stored value. A
/// stored member set of the other member population is never kept.
async fn persist(cache: &GroupCache, group: &Group) {
    cache
        .update(&group.org, &group.team, |stored| {
            if stored.admins_only != group.admins_only {
                stored.users = None;
                stored.admins_only = group.admins_only;
            }
            if group.users.is_some() {
                stored.users = group.users.clone();
            }
            if group.repositories.is_some() {
                stored.repositories = group.repositories.clone();
            }
        })
        .await;
}

/// Resolves repository permissions of accounts and repositories on one code host.
///
/// The provider lists direct grants with every fetch. When a [`GroupCache`] is configured,
/// grants inherited through organizations and teams are resolved per group and shared between
/// fetches. Without a cache every fetch lists all affiliations directly.
#[derive(Debug)]
pub struct Provider<C> {
    urn: String,
    code_host: CodeHost,
    client: C,
    groups_cache: Option<Arc<GroupCache>>,
}

impl<C: DirectoryClient> Provider<C> {
    /// Creates a provider with its own group cache, as configured by `groupsCacheTTL`.
    pub fn new(urn: &str, config: &ProviderConfig, client: C) -> Self {
        let groups_cache = GroupCache::from_ttl(config.groups_cache_ttl()).map(Arc::new);
        Self::with_groups_cache(urn, config, client, groups_cache)
    }

    /// Creates a provider using the given group cache, `None` disables group caching.
    ///
    /// Providers for the same code host can share one cache.
    pub fn with_groups_cache(
        urn: &str,
        config: &ProviderConfig,
        client: C,
        groups_cache: Option<Arc<GroupCache>>,
    ) -> Self {
        let client = if config.token.is_empty() {
            client
        } else {
            client.with_token(&config.token)
        };
        Self {
            urn: urn.to_string(),
            code_host: CodeHost::new(&config.url, SERVICE_TYPE_GITHUB),
            client,
            groups_cache,
        }
    }

    pub fn urn(&self) -> &str {
        &self.urn
    }

    pub fn service_id(&self) -> &str {
        &self.code_host.service_id
    }

    pub fn service_type(&self) -> &str {
        &self.code_host.service_type
    }

    pub fn code_host(&self) -> &CodeHost {
        &self.code_host
    }

    pub fn groups_cache(&self) -> Option<&Arc<GroupCache>> {
        self.groups_cache.as_ref()
    }

    /// Always returns `None`, the code host offers no lookup of accounts by SSO identity.
    pub async fn fetch_account(
        &self,
        _user_id: i32,
        _current: &[Account],
    ) -> Result<Option<Account>, ProviderError> {
        Ok(None)
    }

    /// Checks the base token against the features in use and returns human-readable problems.
    ///
    /// Listing organizations and teams needs an organization scope whenever group caching is
    /// enabled.
    pub async fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.groups_cache.is_none() {
            return problems;
        }

        match self.client.authenticated_oauth_scopes().await {
            Ok(scopes) => {
                if !scopes.iter().any(|scope| ORG_SCOPES.contains(&scope.as_str())) {
                    problems.push(MISSING_ORG_SCOPE.to_string());
                }
            }
            Err(err) => problems.push(format!(
                "Additional OAuth scopes are required, but failed to get available scopes: {err}"
            )),
        }
        problems
    }

    /// Returns ids of the private repositories the account can read.
    ///
    /// Fails without any result if the account does not belong to this code host or carries no
    /// usable token. A listing failing halfway yields the repositories found until then, see
    /// [`Partial`].
    pub async fn fetch_user_perms(
        &self,
        account: &Account,
        opts: &FetchPermsOptions,
    ) -> Result<Partial<ExternalUserPermissions>, ProviderError> {
        if !self.code_host.is_host_of_account(&account.spec) {
            return Err(ProviderError::InvalidAccount {
                want: account.spec.service_id.clone(),
                have: self.code_host.service_id.clone(),
            });
        }
        let token = account
            .data
            .oauth_token()?
            .ok_or(ProviderError::MissingCredential)?;

        let account_id = AccountId::new(account.spec.account_id.clone());
        // Listings on behalf of the account only return what the account can see.
        let client = self.client.with_token(&token.access_token);

        Ok(self
            .fetch_user_perms_with_client(&account_id, &client, opts)
            .await
            .map(|repos| ExternalUserPermissions {
                exacts: repos.into_vec(),
            }))
    }

    async fn fetch_user_perms_with_client(
        &self,
        account_id: &AccountId,
        client: &C,
        opts: &FetchPermsOptions,
    ) -> Partial<IdSet<RepoId>> {
        let mut repos = IdSet::with_capacity(PAGE_SIZE);

        // With group caching, organization repositories are resolved through the groups.
        let affiliations: &[RepositoryAffiliation] = if self.groups_cache.is_some() {
            &[RepositoryAffiliation::Owner, RepositoryAffiliation::Collaborator]
        } else {
            &[]
        };
        let result = for_each_page(
            |page| client.list_affiliated_repositories(Visibility::Private, page, affiliations),
            |page| {
                for repo in page {
                    repos.insert(RepoId::new(repo.id));
                }
            },
        )
        .await;
        if let Err(err) = result {
            warn!(account = %account_id, %err, "listing affiliated repositories failed");
            return Partial::failed(repos, EnumerationError::DirectAffiliations(err));
        }

        let Some(cache) = &self.groups_cache else {
            return Partial::complete(repos);
        };

        let groups = match user_affiliated_groups(cache, client, opts).await {
            Ok(groups) => groups,
            Err(err) => {
                warn!(account = %account_id, %err, "discovering affiliated groups failed");
                return Partial::failed(repos, EnumerationError::UserGroups(err));
            }
        };
        debug!(account = %account_id, groups = groups.len(), "syncing affiliated groups");

        for affiliated in groups {
            let mut group = affiliated.group;

            if group.add_user(account_id) {
                trace!(group = %group.key(), account = %account_id, "add account to cached group");
                persist(cache, &group).await;
            }

            if let Some(cached) = &group.repositories {
                trace!(group = %group.key(), repositories = cached.len(), "use cached repositories");
                repos.extend(cached);
                continue;
            }

            let key = group.key();
            debug!(group = %key, newly_seen = affiliated.newly_seen, "list group repositories");
            let mut group_repos = Vec::with_capacity(PAGE_SIZE);
            let result = for_each_page(
                |page| {
                    let client = &self.client;
                    let key = &key;
                    async move {
                        if key.is_org() {
                            client.list_org_repositories(key.org(), page).await
                        } else {
                            client.list_team_repositories(key.org(), key.team(), page).await
                        }
                    }
                },
                |page| {
                    for repo in page {
                        let repo_id = RepoId::new(repo.id);
                        repos.insert(repo_id.clone());
                        group_repos.push(repo_id);
                    }
                },
            )
            .await;
            if let Err(source) = result {
                warn!(group = %key, err = %source, "listing group repositories failed");
                return Partial::failed(
                    repos,
                    EnumerationError::GroupRepositories { group: key, source },
                );
            }

            group.repositories = Some(group_repos);
            persist(cache, &group).await;
        }

        Partial::complete(repos)
    }

    /// Returns ids of the accounts which can read the repository.
    ///
    /// Includes explicit collaborators and accounts inheriting access through the owning
    /// organization or its teams. A listing failing halfway yields the accounts found until
    /// then, see [`Partial`].
    pub async fn fetch_repo_perms(
        &self,
        repository: &ExternalRepository,
        opts: &FetchPermsOptions,
    ) -> Result<Partial<Vec<AccountId>>, ProviderError> {
        if !self.code_host.is_host_of_repo(&repository.spec) {
            return Err(ProviderError::InvalidRepository {
                want: repository.spec.service_id.clone(),
                have: self.code_host.service_id.clone(),
            });
        }

        // Stored URIs carry neither scheme nor port.
        let name_with_owner = repository
            .uri
            .strip_prefix(self.code_host.hostname())
            .unwrap_or(&repository.uri);
        let name_with_owner = name_with_owner.trim_start_matches('/');
        let (owner, name) = split_name_with_owner(name_with_owner)
            .ok_or_else(|| ProviderError::InvalidRepositoryName(name_with_owner.to_string()))?;

        Ok(self
            .fetch_repo_perms_by_name(&repository.spec.id, owner, name, opts)
            .await
            .map(IdSet::into_vec))
    }

    async fn fetch_repo_perms_by_name(
        &self,
        repo_id: &RepoId,
        owner: &str,
        name: &str,
        opts: &FetchPermsOptions,
    ) -> Partial<IdSet<AccountId>> {
        let mut users = IdSet::with_capacity(PAGE_SIZE);

        // With group caching, organization and team members are resolved through the groups.
        let affiliation = self
            .groups_cache
            .as_ref()
            .map(|_| CollaboratorAffiliation::Direct);
        let result = for_each_page(
            |page| {
                self.client
                    .list_repository_collaborators(owner, name, page, affiliation)
            },
            |page| {
                for collaborator in page {
                    users.insert(AccountId::from(collaborator.database_id));
                }
            },
        )
        .await;
        if let Err(err) = result {
            warn!(owner, name, %err, "listing repository collaborators failed");
            return Partial::failed(users, EnumerationError::Collaborators(err));
        }

        let Some(cache) = &self.groups_cache else {
            return Partial::complete(users);
        };

        let groups = match repo_affiliated_groups(cache, &self.client, owner, name, opts).await {
            Ok(groups) => groups,
            Err(err) => {
                warn!(owner, name, %err, "discovering affiliated groups failed");
                return Partial::failed(users, EnumerationError::RepositoryGroups(err));
            }
        };
        debug!(owner, name, groups = groups.len(), "syncing affiliated groups");

        for affiliated in groups {
            let mut group = affiliated.group;

            if group.add_repository(repo_id) {
                trace!(group = %group.key(), repository = %repo_id, "add repository to cached group");
                persist(cache, &group).await;
            }

            if let Some(cached) = &group.users {
                trace!(group = %group.key(), users = cached.len(), "use cached members");
                users.extend(cached);
                continue;
            }

            let key = group.key();
            let admins_only = group.admins_only;
            debug!(
                group = %key,
                admins_only,
                newly_seen = affiliated.newly_seen,
                "list group members"
            );
            let mut members = Vec::with_capacity(PAGE_SIZE);
            let result = for_each_page(
                |page| {
                    let client = &self.client;
                    let key = &key;
                    async move {
                        if key.is_org() {
                            client
                                .list_organization_members(key.org(), page, admins_only)
                                .await
                        } else {
                            client.list_team_members(key.org(), key.team(), page).await
                        }
                    }
                },
                |page| {
                    for member in page {
                        let account_id = AccountId::from(member.database_id);
                        users.insert(account_id.clone());
                        members.push(account_id);
                    }
                },
            )
            .await;
            if let Err(source) = result {
                warn!(group = %key, err = %source, "listing group members failed");
                return Partial::failed(users, EnumerationError::GroupMembers { group: key, source });
            }

            group.users = Some(members);
            persist(cache, &group).await;
        }

        Partial::complete(users)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovery of the organizations and teams relevant to an account or a repository.
use std::collections::HashSet;

use permsync_directory::{DirectoryClient, DirectoryError, OrgDetailsAndMembership};
use tracing::{debug, trace};

use crate::cache::{Group, GroupCache, GroupKey};
use crate::paginate::for_each_page;
use crate::types::FetchPermsOptions;

/// A group to sync, loaded from the cache if a valid record existed.
#[derive(Clone, Debug)]
pub(crate) struct AffiliatedGroup {
    pub group: Group,

    /// No valid record was cached before this fetch.
    pub newly_seen: bool,
}

/// Returns `true` if the organization membership lets the account read every repository of the
/// organization.
///
/// That is the case for active admins and whenever the organization's default repository
/// permission grants at least read access to all members.
pub(crate) fn can_view_org_repos(org: &OrgDetailsAndMembership) -> bool {
    if org
        .membership
        .as_ref()
        .is_some_and(|membership| membership.is_active_admin())
    {
        return true;
    }
    org.details.default_repository_permission.grants_read()
}

/// Collects groups for one fetch, consulting the cache for each.
struct Discovery<'a> {
    cache: &'a GroupCache,
    opts: &'a FetchPermsOptions,
    seen: HashSet<GroupKey>,
    groups: Vec<AffiliatedGroup>,
}

impl<'a> Discovery<'a> {
    fn new(cache: &'a GroupCache, opts: &'a FetchPermsOptions) -> Self {
        Self {
            cache,
            opts,
            seen: HashSet::new(),
            groups: Vec::new(),
        }
    }

    fn includes(&self, org: &str, team: &str) -> bool {
        self.seen.contains(&GroupKey::new(org, team))
    }

    /// Adds a group to the sync list, pulling its record from the cache.
    ///
    /// When `admins_only` is given it pins which member population the group stands for. A
    /// cached member set of the other population is dropped.
    async fn sync_group(&mut self, org: &str, team: &str, admins_only: Option<bool>) {
        if !self.seen.insert(GroupKey::new(org, team)) {
            return;
        }

        let (mut group, existed) = self.cache.get(org, team).await;
        if existed && self.opts.invalidate_caches {
            self.cache.invalidate(&mut group).await;
        }
        if let Some(admins_only) = admins_only {
            if group.admins_only != admins_only && group.users.take().is_some() {
                debug!(group = %group.key(), admins_only, "cached members describe other population");
            }
            group.admins_only = admins_only;
        }

        trace!(
            group = %group.key(),
            cached = existed,
            users = group.users.is_some(),
            repositories = group.repositories.is_some(),
            "discovered group"
        );
        self.groups.push(AffiliatedGroup {
            group,
            newly_seen: !existed,
        });
    }
}

/// Finds the organizations and teams granting the authenticated account access to repositories.
///
/// `client_with_token` must be authenticated as the account itself, the listings
/// answer from the perspective of the credential.
///
/// Organizations are listed before teams and an organization included as a whole makes its
/// teams redundant: a team's repositories are a subset of a readable organization's.
pub(crate) async fn user_affiliated_groups<C: DirectoryClient>(
    cache: &GroupCache,
    client_with_token: &C,
    opts: &FetchPermsOptions,
) -> Result<Vec<AffiliatedGroup>, DirectoryError> {
    let mut discovery = Discovery::new(cache, opts);

    let mut orgs = Vec::new();
    for_each_page(
        |page| client_with_token.authenticated_user_orgs(page),
        |page| {
            // Only if this account can view all of the org's repos, the entire org
            // is synced.
            orgs.extend(page.into_iter().filter(can_view_org_repos).map(|org| {
                // An org readable by this account only as an admin stands for its admins.
                let admins_only = !org.details.default_repository_permission.grants_read();
                (org.details.login, admins_only)
            }));
        },
    )
    .await?;
    for (org, admins_only) in orgs {
        discovery.sync_group(&org, "", Some(admins_only)).await;
    }

    let mut teams = Vec::new();
    for_each_page(
        |page| client_with_token.authenticated_user_teams(page),
        |page| {
            teams.extend(page.into_iter().filter_map(|team| {
                let org = team.organization?;
                (team.repos_count > 0).then_some((org.login, team.slug))
            }));
        },
    )
    .await?;
    for (org, team) in teams {
        if discovery.includes(&org, "") {
            trace!(org = %org, team = %team, "skip team of readable organization");
            continue;
        }
        discovery.sync_group(&org, &team, None).await;
    }

    Ok(discovery.groups)
}

/// Finds the organization and teams through which accounts can read the given repository.
///
/// Repositories owned by a user account have no groups. If all organization members can read the
/// repository the whole organization is returned. Otherwise only the organization's admins are
/// attributed access, alongside every team tied to the repository.
pub(crate) async fn repo_affiliated_groups<C: DirectoryClient>(
    cache: &GroupCache,
    client: &C,
    owner: &str,
    name: &str,
    opts: &FetchPermsOptions,
) -> Result<Vec<AffiliatedGroup>, DirectoryError> {
    let org = match client.get_organization(owner).await {
        Ok(org) => org,
        Err(err) if err.is_not_found() => {
            debug!(owner, "repository owner is not an organization");
            return Ok(Vec::new());
        }
        Err(err) => return Err(err),
    };

    let mut discovery = Discovery::new(cache, opts);
    if org.default_repository_permission.grants_read() {
        // All members of this org can read the repository.
        discovery.sync_group(owner, "", Some(false)).await;
        return Ok(discovery.groups);
    }

    // Only admins of this org are granted access implicitly.
    discovery.sync_group(owner, "", Some(true)).await;

    let mut teams = Vec::new();
    for_each_page(
        |page| client.list_repository_teams(owner, name, page),
        |page| teams.extend(page.into_iter().map(|team| team.slug)),
    )
    .await?;
    for team in teams {
        discovery.sync_group(owner, &team, Some(false)).await;
    }

    Ok(discovery.groups)
}

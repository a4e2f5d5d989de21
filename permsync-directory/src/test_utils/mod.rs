// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory directory for tests.
//!
//! `MockDirectory` models a tiny code host: users with tokens, organizations with members and
//! teams, and repositories owned by either. All listings are derived from that model the same
//! way GitHub derives them, so permission syncing can be tested end-to-end without a network.
//!
//! Every call is counted per [`Operation`] and failures can be injected for a specific page of
//! an operation.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::trace;

use crate::client::DirectoryClient;
use crate::error::DirectoryError;
use crate::page::{PAGE_SIZE, Page};
use crate::types::{
    Collaborator, CollaboratorAffiliation, MembershipState, OrgDetails, OrgDetailsAndMembership,
    OrgMembership, OrgRef, OrgRole, Repository, RepositoryAffiliation, RepositoryPermission,
    Team, Visibility,
};

/// Directory operations, used for counting calls and injecting failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    AffiliatedRepositories,
    OrgRepositories,
    TeamRepositories,
    RepositoryCollaborators,
    OrganizationMembers,
    TeamMembers,
    GetOrganization,
    RepositoryTeams,
    UserOrgs,
    UserTeams,
    OAuthScopes,
}

#[derive(Clone, Debug)]
struct MockUser {
    database_id: i64,
    token: String,
}

#[derive(Clone, Debug, Default)]
struct MockTeam {
    members: Vec<String>,
    repositories: Vec<String>,
}

#[derive(Clone, Debug)]
struct MockOrg {
    default_repository_permission: RepositoryPermission,
    members: BTreeMap<String, OrgRole>,
    teams: BTreeMap<String, MockTeam>,
}

#[derive(Clone, Debug)]
struct MockRepo {
    repository: Repository,
    owner: String,
    collaborators: Vec<String>,
}

#[derive(Debug)]
struct DirectoryState {
    page_size: usize,
    next_database_id: i64,
    users: BTreeMap<String, MockUser>,
    orgs: BTreeMap<String, MockOrg>,
    repos: Vec<MockRepo>,
    scopes: Vec<String>,
    calls: HashMap<Operation, usize>,
    failures: HashMap<(Operation, usize), DirectoryError>,
}

impl Default for DirectoryState {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            next_database_id: 1000,
            users: Default::default(),
            orgs: Default::default(),
            repos: Default::default(),
            scopes: Default::default(),
            calls: Default::default(),
            failures: Default::default(),
        }
    }
}

impl DirectoryState {
    fn user_by_token(&self, token: Option<&str>) -> Result<(String, MockUser), DirectoryError> {
        let token = token.ok_or(DirectoryError::Unauthorized)?;
        self.users
            .iter()
            .find(|(_, user)| user.token == token)
            .map(|(login, user)| (login.clone(), user.clone()))
            .ok_or(DirectoryError::Unauthorized)
    }

    fn collaborator(&self, login: &str) -> Option<Collaborator> {
        self.users.get(login).map(|user| Collaborator {
            login: login.to_string(),
            database_id: user.database_id,
        })
    }

    fn collaborators<'a>(&self, logins: impl IntoIterator<Item = &'a String>) -> Vec<Collaborator> {
        let mut result: Vec<Collaborator> = Vec::new();
        for login in logins {
            if result.iter().any(|c| &c.login == login) {
                continue;
            }
            if let Some(collaborator) = self.collaborator(login) {
                result.push(collaborator);
            }
        }
        result
    }

    fn repo(&self, owner: &str, name: &str) -> Result<&MockRepo, DirectoryError> {
        let name_with_owner = format!("{owner}/{name}");
        self.repos
            .iter()
            .find(|repo| repo.repository.name_with_owner == name_with_owner)
            .ok_or(DirectoryError::NotFound(name_with_owner))
    }

    fn org(&self, login: &str) -> Result<&MockOrg, DirectoryError> {
        self.orgs
            .get(login)
            .ok_or_else(|| DirectoryError::NotFound(format!("orgs/{login}")))
    }

    fn team(&self, org: &str, slug: &str) -> Result<&MockTeam, DirectoryError> {
        self.org(org)?
            .teams
            .get(slug)
            .ok_or_else(|| DirectoryError::NotFound(format!("orgs/{org}/teams/{slug}")))
    }

    fn team_view(org: &str, slug: &str, team: &MockTeam) -> Team {
        Team {
            slug: slug.to_string(),
            name: slug.to_string(),
            repos_count: team.repositories.len() as u64,
            organization: Some(OrgRef {
                login: org.to_string(),
            }),
        }
    }

    /// Returns `true` if `login` can read `repo` through organization or team membership.
    fn has_org_access(&self, login: &str, repo: &MockRepo) -> bool {
        let Some(org) = self.orgs.get(&repo.owner) else {
            return false;
        };
        match org.members.get(login) {
            Some(OrgRole::Admin) => return true,
            Some(OrgRole::Member) if org.default_repository_permission.grants_read() => {
                return true;
            }
            _ => (),
        }
        org.teams.values().any(|team| {
            team.members.iter().any(|member| member == login)
                && team.repositories.contains(&repo.repository.name_with_owner)
        })
    }

    fn record(&mut self, operation: Operation, page: usize) -> Result<(), DirectoryError> {
        *self.calls.entry(operation).or_default() += 1;
        if let Some(err) = self.failures.get(&(operation, page)) {
            trace!(?operation, page, "injected directory failure");
            return Err(err.clone());
        }
        Ok(())
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: usize, page_size: usize) -> Result<Page<T>, DirectoryError> {
    if page == 0 {
        return Err(DirectoryError::Other("pages are 1-based".into()));
    }
    let start = (page - 1) * page_size;
    if start >= items.len() {
        return Ok(Page::last(Vec::new()));
    }
    let end = (start + page_size).min(items.len());
    Ok(Page::new(items[start..end].to_vec(), end < items.len()))
}

/// In-memory code host implementing [`DirectoryClient`].
///
/// Clones share the same state. A client created with [`DirectoryClient::with_token`] answers
/// the "authenticated" listings as the user owning that token, the base client has no user and
/// gets [`DirectoryError::Unauthorized`] for them.
#[derive(Clone, Debug, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<DirectoryState>>,
    token: Option<String>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a smaller page size to exercise pagination.
    pub fn with_page_size(self, page_size: usize) -> Self {
        assert!(page_size > 0);
        self.state().page_size = page_size;
        self
    }

    fn state(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().expect("mock directory lock poisoned")
    }

    /// Registers a user account and returns its numeric id.
    pub fn add_user(&self, login: &str, token: &str) -> i64 {
        let mut state = self.state();
        let database_id = state.next_database_id;
        state.next_database_id += 1;
        state.users.insert(
            login.to_string(),
            MockUser {
                database_id,
                token: token.to_string(),
            },
        );
        database_id
    }

    pub fn add_org(&self, login: &str, default_repository_permission: RepositoryPermission) {
        self.state().orgs.insert(
            login.to_string(),
            MockOrg {
                default_repository_permission,
                members: BTreeMap::new(),
                teams: BTreeMap::new(),
            },
        );
    }

    pub fn set_default_repository_permission(&self, org: &str, permission: RepositoryPermission) {
        let mut state = self.state();
        let org = state.orgs.get_mut(org).expect("org exists");
        org.default_repository_permission = permission;
    }

    pub fn add_org_member(&self, org: &str, login: &str, role: OrgRole) {
        let mut state = self.state();
        let org = state.orgs.get_mut(org).expect("org exists");
        org.members.insert(login.to_string(), role);
    }

    pub fn add_team(&self, org: &str, slug: &str) {
        let mut state = self.state();
        let org = state.orgs.get_mut(org).expect("org exists");
        org.teams.insert(slug.to_string(), MockTeam::default());
    }

    pub fn add_team_member(&self, org: &str, slug: &str, login: &str) {
        let mut state = self.state();
        let org = state.orgs.get_mut(org).expect("org exists");
        org.members
            .entry(login.to_string())
            .or_insert(OrgRole::Member);
        let team = org.teams.get_mut(slug).expect("team exists");
        team.members.push(login.to_string());
    }

    pub fn add_team_repository(&self, org: &str, slug: &str, name_with_owner: &str) {
        let mut state = self.state();
        let org = state.orgs.get_mut(org).expect("org exists");
        let team = org.teams.get_mut(slug).expect("team exists");
        team.repositories.push(name_with_owner.to_string());
    }

    /// Adds a repository owned by a user or an organization.
    pub fn add_repository(&self, id: &str, owner: &str, name: &str, is_private: bool) -> Repository {
        let mut state = self.state();
        let database_id = state.next_database_id;
        state.next_database_id += 1;
        let repository = Repository {
            id: id.to_string(),
            database_id,
            name_with_owner: format!("{owner}/{name}"),
            is_private,
        };
        state.repos.push(MockRepo {
            repository: repository.clone(),
            owner: owner.to_string(),
            collaborators: Vec::new(),
        });
        repository
    }

    pub fn add_collaborator(&self, name_with_owner: &str, login: &str) {
        let mut state = self.state();
        let repo = state
            .repos
            .iter_mut()
            .find(|repo| repo.repository.name_with_owner == name_with_owner)
            .expect("repository exists");
        repo.collaborators.push(login.to_string());
    }

    pub fn set_oauth_scopes(&self, scopes: &[&str]) {
        self.state().scopes = scopes.iter().map(|scope| scope.to_string()).collect();
    }

    /// Makes every request for the given page of an operation fail with `err`.
    pub fn fail_on(&self, operation: Operation, page: usize, err: DirectoryError) {
        self.state().failures.insert((operation, page), err);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Number of requests made for an operation, including failed ones.
    pub fn calls(&self, operation: Operation) -> usize {
        self.state().calls.get(&operation).copied().unwrap_or_default()
    }

    pub fn reset_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl DirectoryClient for MockDirectory {
    fn with_token(&self, token: &str) -> Self {
        Self {
            state: self.state.clone(),
            token: Some(token.to_string()),
        }
    }

    async fn list_affiliated_repositories(
        &self,
        visibility: Visibility,
        page: usize,
        affiliations: &[RepositoryAffiliation],
    ) -> Result<Page<Repository>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::AffiliatedRepositories, page)?;
        let (login, _) = state.user_by_token(self.token.as_deref())?;

        let wants = |affiliation: RepositoryAffiliation| {
            affiliations.is_empty() || affiliations.contains(&affiliation)
        };
        let repos = state
            .repos
            .iter()
            .filter(|repo| match visibility {
                Visibility::All => true,
                Visibility::Private => repo.repository.is_private,
                Visibility::Public => !repo.repository.is_private,
            })
            .filter(|repo| {
                (wants(RepositoryAffiliation::Owner) && repo.owner == login)
                    || (wants(RepositoryAffiliation::Collaborator)
                        && repo.collaborators.contains(&login))
                    || (wants(RepositoryAffiliation::OrganizationMember)
                        && state.has_org_access(&login, repo))
            })
            .map(|repo| repo.repository.clone())
            .collect();

        paginate(repos, page, state.page_size)
    }

    async fn list_org_repositories(
        &self,
        org: &str,
        page: usize,
    ) -> Result<Page<Repository>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::OrgRepositories, page)?;
        state.org(org)?;
        let repos = state
            .repos
            .iter()
            .filter(|repo| repo.owner == org)
            .map(|repo| repo.repository.clone())
            .collect();
        paginate(repos, page, state.page_size)
    }

    async fn list_team_repositories(
        &self,
        org: &str,
        team: &str,
        page: usize,
    ) -> Result<Page<Repository>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::TeamRepositories, page)?;
        let names = state.team(org, team)?.repositories.clone();
        let repos = state
            .repos
            .iter()
            .filter(|repo| names.contains(&repo.repository.name_with_owner))
            .map(|repo| repo.repository.clone())
            .collect();
        paginate(repos, page, state.page_size)
    }

    async fn list_repository_collaborators(
        &self,
        owner: &str,
        name: &str,
        page: usize,
        affiliation: Option<CollaboratorAffiliation>,
    ) -> Result<Page<Collaborator>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::RepositoryCollaborators, page)?;
        let repo = state.repo(owner, name)?;
        let owning_org = state.orgs.get(owner);

        let mut logins: Vec<String> = Vec::new();
        if owning_org.is_none() {
            logins.push(owner.to_string());
        }
        match affiliation {
            Some(CollaboratorAffiliation::Direct) => {
                logins.extend(repo.collaborators.iter().cloned());
            }
            Some(CollaboratorAffiliation::Outside) => {
                logins.extend(
                    repo.collaborators
                        .iter()
                        .filter(|login| {
                            owning_org.is_none_or(|org| !org.members.contains_key(*login))
                        })
                        .cloned(),
                );
            }
            Some(CollaboratorAffiliation::All) | None => {
                logins.extend(repo.collaborators.iter().cloned());
                if let Some(org) = owning_org {
                    logins.extend(
                        org.members
                            .keys()
                            .filter(|login| state.has_org_access(login, repo))
                            .cloned(),
                    );
                }
            }
        }

        let collaborators = state.collaborators(&logins);
        paginate(collaborators, page, state.page_size)
    }

    async fn list_organization_members(
        &self,
        org: &str,
        page: usize,
        admins_only: bool,
    ) -> Result<Page<Collaborator>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::OrganizationMembers, page)?;
        let logins: Vec<String> = state
            .org(org)?
            .members
            .iter()
            .filter(|(_, role)| !admins_only || **role == OrgRole::Admin)
            .map(|(login, _)| login.clone())
            .collect();
        let members = state.collaborators(&logins);
        paginate(members, page, state.page_size)
    }

    async fn list_team_members(
        &self,
        org: &str,
        team: &str,
        page: usize,
    ) -> Result<Page<Collaborator>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::TeamMembers, page)?;
        let logins = state.team(org, team)?.members.clone();
        let members = state.collaborators(&logins);
        paginate(members, page, state.page_size)
    }

    async fn get_organization(&self, login: &str) -> Result<OrgDetails, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::GetOrganization, 1)?;
        let org = state.org(login)?;
        Ok(OrgDetails {
            login: login.to_string(),
            default_repository_permission: org.default_repository_permission,
        })
    }

    async fn list_repository_teams(
        &self,
        owner: &str,
        name: &str,
        page: usize,
    ) -> Result<Page<Team>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::RepositoryTeams, page)?;
        let name_with_owner = state.repo(owner, name)?.repository.name_with_owner.clone();
        let teams = state
            .org(owner)?
            .teams
            .iter()
            .filter(|(_, team)| team.repositories.contains(&name_with_owner))
            .map(|(slug, team)| DirectoryState::team_view(owner, slug, team))
            .collect();
        paginate(teams, page, state.page_size)
    }

    async fn authenticated_user_orgs(
        &self,
        page: usize,
    ) -> Result<Page<OrgDetailsAndMembership>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::UserOrgs, page)?;
        let (login, _) = state.user_by_token(self.token.as_deref())?;
        let orgs = state
            .orgs
            .iter()
            .filter_map(|(org_login, org)| {
                org.members.get(&login).map(|role| OrgDetailsAndMembership {
                    details: OrgDetails {
                        login: org_login.clone(),
                        default_repository_permission: org.default_repository_permission,
                    },
                    membership: Some(OrgMembership {
                        state: MembershipState::Active,
                        role: *role,
                    }),
                })
            })
            .collect();
        paginate(orgs, page, state.page_size)
    }

    async fn authenticated_user_teams(&self, page: usize) -> Result<Page<Team>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::UserTeams, page)?;
        let (login, _) = state.user_by_token(self.token.as_deref())?;
        let teams = state
            .orgs
            .iter()
            .flat_map(|(org_login, org)| {
                org.teams
                    .iter()
                    .filter(|(_, team)| team.members.contains(&login))
                    .map(move |(slug, team)| DirectoryState::team_view(org_login, slug, team))
            })
            .collect();
        paginate(teams, page, state.page_size)
    }

    async fn authenticated_oauth_scopes(&self) -> Result<Vec<String>, DirectoryError> {
        let mut state = self.state();
        state.record(Operation::OAuthScopes, 1)?;
        Ok(state.scopes.clone())
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::page::Page;
use crate::types::{
    Collaborator, CollaboratorAffiliation, OrgDetails, OrgDetailsAndMembership, Repository,
    RepositoryAffiliation, Team, Visibility,
};

/// Paginated, read-only view on a code host's directory of repositories, organizations, teams
/// and memberships.
///
/// A client is always bound to one credential. The "authenticated" listings answer from the
/// perspective of that credential, which is why permission syncing derives a user-scoped client
/// via [`DirectoryClient::with_token`] before asking what a user can see.
///
/// Implementations are expected to be cheap to clone and to handle retries and rate limits
/// internally. Every page index is 1-based.
#[async_trait]
pub trait DirectoryClient: Clone + Debug + Send + Sync {
    /// Returns a copy of this client acting with the given bearer token instead of the base
    /// credential.
    fn with_token(&self, token: &str) -> Self;

    /// Lists repositories the authenticated account is affiliated with.
    ///
    /// An empty `affiliations` slice does not filter by affiliation.
    async fn list_affiliated_repositories(
        &self,
        visibility: Visibility,
        page: usize,
        affiliations: &[RepositoryAffiliation],
    ) -> Result<Page<Repository>, DirectoryError>;

    /// Lists all repositories of an organization.
    async fn list_org_repositories(
        &self,
        org: &str,
        page: usize,
    ) -> Result<Page<Repository>, DirectoryError>;

    /// Lists repositories associated with a team of an organization.
    async fn list_team_repositories(
        &self,
        org: &str,
        team: &str,
        page: usize,
    ) -> Result<Page<Repository>, DirectoryError>;

    /// Lists collaborators of a repository.
    ///
    /// Without an affiliation filter every account with access is returned.
    async fn list_repository_collaborators(
        &self,
        owner: &str,
        name: &str,
        page: usize,
        affiliation: Option<CollaboratorAffiliation>,
    ) -> Result<Page<Collaborator>, DirectoryError>;

    /// Lists members of an organization, or only its admins.
    async fn list_organization_members(
        &self,
        org: &str,
        page: usize,
        admins_only: bool,
    ) -> Result<Page<Collaborator>, DirectoryError>;

    /// Lists members of a team.
    async fn list_team_members(
        &self,
        org: &str,
        team: &str,
        page: usize,
    ) -> Result<Page<Collaborator>, DirectoryError>;

    /// Fetches organization details including its default repository permission.
    ///
    /// Fails with [`DirectoryError::NotFound`] if `login` is not an organization.
    async fn get_organization(&self, login: &str) -> Result<OrgDetails, DirectoryError>;

    /// Lists teams which have been granted access to a repository.
    async fn list_repository_teams(
        &self,
        owner: &str,
        name: &str,
        page: usize,
    ) -> Result<Page<Team>, DirectoryError>;

    /// Lists organizations of the authenticated account together with its membership details.
    async fn authenticated_user_orgs(
        &self,
        page: usize,
    ) -> Result<Page<OrgDetailsAndMembership>, DirectoryError>;

    /// Lists teams the authenticated account is a member of, across all organizations.
    async fn authenticated_user_teams(&self, page: usize) -> Result<Page<Team>, DirectoryError>;

    /// Returns the OAuth scopes granted to the client's credential.
    async fn authenticated_oauth_scopes(&self) -> Result<Vec<String>, DirectoryError>;
}

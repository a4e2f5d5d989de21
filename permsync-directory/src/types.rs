// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code host data types as returned by directory listings.
//!
//! The shapes follow GitHub's REST API, restricted to the fields permission syncing looks at.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Visibility filter for repository listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    All,
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::All => "all",
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// How the authenticated account relates to a repository it can see.
///
/// An empty affiliation filter means "all of them".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryAffiliation {
    /// Repositories owned by the account.
    Owner,

    /// Repositories the account was added to as a collaborator.
    Collaborator,

    /// Repositories the account can access through organization or team membership.
    OrganizationMember,
}

impl RepositoryAffiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryAffiliation::Owner => "owner",
            RepositoryAffiliation::Collaborator => "collaborator",
            RepositoryAffiliation::OrganizationMember => "organization_member",
        }
    }
}

/// Filter for repository collaborator listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaboratorAffiliation {
    /// Collaborators who are not members of the owning organization.
    Outside,

    /// Collaborators with explicit permissions on the repository, regardless of membership.
    Direct,

    /// Everyone who can access the repository, including through organization and teams.
    All,
}

impl CollaboratorAffiliation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaboratorAffiliation::Outside => "outside",
            CollaboratorAffiliation::Direct => "direct",
            CollaboratorAffiliation::All => "all",
        }
    }
}

/// Organization-wide base permission granted to every member on every repository.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryPermission {
    #[default]
    None,
    Read,
    Write,
    Admin,
}

impl RepositoryPermission {
    /// Returns `true` if this base permission lets members read repositories.
    pub fn grants_read(&self) -> bool {
        matches!(
            self,
            RepositoryPermission::Read | RepositoryPermission::Write | RepositoryPermission::Admin
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    Active,
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Admin,
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Globally unique node id of the repository.
    pub id: String,

    pub database_id: i64,

    /// `owner/name`.
    pub name_with_owner: String,

    pub is_private: bool,
}

/// An account with access to a repository or membership in a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub login: String,

    /// Numeric account id, this is what external accounts are keyed by.
    pub database_id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRef {
    pub login: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub slug: String,

    pub name: String,

    /// Number of repositories the team is associated with.
    pub repos_count: u64,

    pub organization: Option<OrgRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgDetails {
    pub login: String,

    pub default_repository_permission: RepositoryPermission,
}

/// Membership of the authenticated account in an organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgMembership {
    pub state: MembershipState,

    pub role: OrgRole,
}

impl OrgMembership {
    pub fn is_active_admin(&self) -> bool {
        self.state == MembershipState::Active && self.role == OrgRole::Admin
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgDetailsAndMembership {
    pub details: OrgDetails,

    pub membership: Option<OrgMembership>,
}

impl Display for RepositoryPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RepositoryPermission::None => "none",
            RepositoryPermission::Read => "read",
            RepositoryPermission::Write => "write",
            RepositoryPermission::Admin => "admin",
        };

        write!(f, "{}", s)
    }
}

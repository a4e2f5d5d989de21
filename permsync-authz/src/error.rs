// SPDX-License-Identifier: MIT OR Apache-2.0

use permsync_directory::DirectoryError;
use thiserror::Error;

use crate::cache::GroupKey;

/// Precondition failures of a permission fetch.
///
/// These fail fast: nothing was listed yet, so there is no partial result.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not a code host of the account: want {want:?} but have {have:?}")]
    InvalidAccount { want: String, have: String },

    #[error("no token found in the external account data")]
    MissingCredential,

    #[error("get external account data: {0}")]
    InvalidAccountData(#[from] serde_json::Error),

    #[error("not a code host of the repository: want {want:?} but have {have:?}")]
    InvalidRepository { want: String, have: String },

    #[error("invalid repository name {0:?}, expected owner/name")]
    InvalidRepositoryName(String),
}

/// Stage of a permission fetch in which an enumeration failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncPhase {
    /// Listing direct affiliations or collaborators.
    Direct,

    /// Discovering organizations and teams.
    GroupDiscovery,

    /// Listing repositories or members of a single group.
    GroupEnumeration,
}

/// A paginated listing failed halfway through a fetch.
///
/// Travels alongside the ids accumulated before the failure, see [`crate::Partial`].
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("list repos for user: {0}")]
    DirectAffiliations(#[source] DirectoryError),

    #[error("list users for repo: {0}")]
    Collaborators(#[source] DirectoryError),

    #[error("get groups affiliated with user: {0}")]
    UserGroups(#[source] DirectoryError),

    #[error("get groups affiliated with repo: {0}")]
    RepositoryGroups(#[source] DirectoryError),

    #[error("list repos for group {group}: {source}")]
    GroupRepositories {
        group: GroupKey,
        source: DirectoryError,
    },

    #[error("list users for group {group}: {source}")]
    GroupMembers {
        group: GroupKey,
        source: DirectoryError,
    },
}

impl EnumerationError {
    pub fn phase(&self) -> SyncPhase {
        match self {
            EnumerationError::DirectAffiliations(_) | EnumerationError::Collaborators(_) => {
                SyncPhase::Direct
            }
            EnumerationError::UserGroups(_) | EnumerationError::RepositoryGroups(_) => {
                SyncPhase::GroupDiscovery
            }
            EnumerationError::GroupRepositories { .. } | EnumerationError::GroupMembers { .. } => {
                SyncPhase::GroupEnumeration
            }
        }
    }

    /// The directory failure which interrupted the enumeration.
    pub fn directory_error(&self) -> &DirectoryError {
        match self {
            EnumerationError::DirectAffiliations(err)
            | EnumerationError::Collaborators(err)
            | EnumerationError::UserGroups(err)
            | EnumerationError::RepositoryGroups(err) => err,
            EnumerationError::GroupRepositories { source, .. }
            | EnumerationError::GroupMembers { source, .. } => source,
        }
    }
}

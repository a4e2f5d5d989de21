// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only, paginated access to a code host's repositories, organizations, teams and
//! memberships.
//!
//! The permission syncing engine never talks HTTP itself. It consumes the narrow
//! [`DirectoryClient`] capability defined here, and every code host adapter (a GitHub REST
//! client, a caching proxy, the in-memory [`test_utils::MockDirectory`]) implements it.
//!
//! All listing operations are paginated. Pages are 1-based and every call returns a [`Page`]
//! which tells the caller whether another page follows. Transport concerns like retries,
//! rate-limit backoff or JSON decoding live inside the concrete clients, the contract only
//! surfaces the resulting [`DirectoryError`].
mod client;
mod error;
mod page;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
mod types;

pub use client::DirectoryClient;
pub use error::DirectoryError;
pub use page::{PAGE_SIZE, Page};
pub use types::{
    Collaborator, CollaboratorAffiliation, MembershipState, OrgDetails, OrgDetailsAndMembership,
    OrgMembership, OrgRef, OrgRole, Repository, RepositoryAffiliation, RepositoryPermission,
    Team, Visibility,
};

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronise repository permissions from a code host into an internal authorization model.
//!
//! A [`Provider`] answers two questions for a single code host:
//!
//! - which private repositories can this account read? ([`Provider::fetch_user_perms`])
//! - which accounts can read this repository? ([`Provider::fetch_repo_perms`])
//!
//! Direct grants (ownership, explicit collaboration) are listed per call. Grants inherited
//! through organization or team membership are resolved per _group_ and kept in a shared
//! [`GroupCache`], so that a large organization's repositories or members are enumerated once
//! per TTL window instead of once per account or repository.
//!
//! ## Security policy
//!
//! Membership in an organization only counts as "access to every repository of it" if the
//! organization's default repository permission lets members read, or if the account is an
//! active admin of the organization. For organizations with a restrictive default permission
//! only admins are attributed organization-wide access, everyone else needs an explicit
//! collaboration or a team tied to the repository.
//!
//! ## Partial results
//!
//! Enumerations page through the code host and can fail halfway, for example when a rate limit
//! is hit. Instead of discarding everything, fetches return a [`Partial`] holding whatever was
//! accumulated until the failure together with the [`EnumerationError`]. Callers explicitly
//! choose between [`Partial::into_result`] (all or nothing) and best-effort coverage via
//! [`Partial::into_parts`]. A best-effort result comes with no completeness guarantee.
//!
//! Groups are only written back to the cache after a complete enumeration, a failure never
//! leaves a truncated group behind.
pub mod cache;
mod config;
mod error;
mod paginate;
mod partial;
mod provider;
#[cfg(test)]
mod test_utils;
mod types;

pub use cache::{Group, GroupCache, GroupKey};
pub use config::{DEFAULT_GROUPS_CACHE_TTL_HOURS, ProviderConfig};
pub use error::{EnumerationError, ProviderError, SyncPhase};
pub use partial::Partial;
pub use provider::Provider;
pub use types::{
    Account, AccountData, AccountId, AccountSpec, CodeHost, ExternalRepoSpec, ExternalRepository,
    ExternalUserPermissions, FetchPermsOptions, OAuthToken, RepoId, SERVICE_TYPE_GITHUB,
};

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache of repositories and members affiliated with organizations and teams.
//!
//! A [`Group`] is either a whole organization or one team within it. Both its member set and its
//! repository set are optional and populated independently: syncing a user fills in the
//! repositories of that user's groups, syncing a repository fills in the members of that
//! repository's groups. Consumers must check each field on its own.
//!
//! Records are plain values. The cache never merges on its own: a writer either replaces the
//! whole record with [`GroupCache::set`], where the last writer wins, or hands its merge to
//! [`GroupCache::update`] which applies it to the stored record under the lock.

use std::collections::HashMap;
use std::fmt::Display;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use crate::types::{AccountId, RepoId};

/// Identifies a group by organization and team. An empty team denotes the whole organization.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    org: String,
    team: String,
}

impl GroupKey {
    pub fn new(org: &str, team: &str) -> Self {
        Self {
            org: org.to_string(),
            team: team.to_string(),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    /// Returns `true` if the key denotes a whole organization.
    pub fn is_org(&self) -> bool {
        self.team.is_empty()
    }
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.team.is_empty() {
            write!(f, "{}", self.org)
        } else {
            write!(f, "{}/{}", self.org, self.team)
        }
    }
}

/// Cached affiliations of an organization or team.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub org: String,

    /// Team slug, empty for the whole organization.
    pub team: String,

    /// Accounts affiliated with the group, `None` if not known yet.
    pub users: Option<Vec<AccountId>>,

    /// Repositories affiliated with the group, `None` if not known yet.
    pub repositories: Option<Vec<RepoId>>,

    /// The member set holds the organization's admins rather than all of its members.
    pub admins_only: bool,

    refreshed_at: Option<Instant>,
}

impl Group {
    pub fn new(org: &str, team: &str) -> Self {
        Self {
            org: org.to_string(),
            team: team.to_string(),
            users: None,
            repositories: None,
            admins_only: false,
            refreshed_at: None,
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey::new(&self.org, &self.team)
    }

    pub fn is_org(&self) -> bool {
        self.team.is_empty()
    }

    /// When this record was last written to the cache.
    pub fn refreshed_at(&self) -> Option<Instant> {
        self.refreshed_at
    }

    /// Appends an account to a known member set.
    ///
    /// Returns `true` if the account was appended. An unknown member set stays unknown, a single
    /// account would otherwise pass for the complete set.
    pub fn add_user(&mut self, account_id: &AccountId) -> bool {
        match &mut self.users {
            Some(users) if !users.contains(account_id) => {
                users.push(account_id.clone());
                true
            }
            _ => false,
        }
    }

    /// Appends a repository to a known repository set.
    ///
    /// Returns `true` if the repository was appended, see [`Group::add_user`].
    pub fn add_repository(&mut self, repo_id: &RepoId) -> bool {
        match &mut self.repositories {
            Some(repositories) if !repositories.contains(repo_id) => {
                repositories.push(repo_id.clone());
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self) {
        self.users = None;
        self.repositories = None;
    }
}

/// Process-wide store of [`Group`] records with a time-to-live.
///
/// All state sits behind one lock. Lookups are pure memory operations and never wait for the
/// network, directory listings happen outside of the cache.
#[derive(Debug)]
pub struct GroupCache {
    ttl: Duration,
    groups: Mutex<HashMap<GroupKey, Group>>,
}

impl GroupCache {
    /// Creates a cache whose records expire `ttl` after they were written.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a cache if caching is enabled, that is if a non-zero TTL is given.
    pub fn from_ttl(ttl: Option<Duration>) -> Option<Self> {
        ttl.filter(|ttl| !ttl.is_zero()).map(Self::new)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, group: &Group) -> bool {
        group
            .refreshed_at
            .is_none_or(|refreshed_at| refreshed_at.elapsed() >= self.ttl)
    }

    /// Returns the stored record and `true`, or an empty record for the key and `false` if
    /// nothing valid is stored.
    ///
    /// Expired records are dropped here and reported as absent.
    pub async fn get(&self, org: &str, team: &str) -> (Group, bool) {
        let key = GroupKey::new(org, team);
        let mut groups = self.groups.lock().await;
        let expired = match groups.get(&key) {
            Some(group) if !self.is_expired(group) => return (group.clone(), true),
            Some(_) => true,
            None => false,
        };
        if expired {
            trace!(group = %key, "cached group expired");
            groups.remove(&key);
        }
        (Group::new(org, team), false)
    }

    /// Stores the full record, replacing any previous one.
    pub async fn set(&self, mut group: Group) {
        group.refreshed_at = Some(Instant::now());
        trace!(
            group = %group.key(),
            users = ?group.users.as_ref().map(Vec::len),
            repositories = ?group.repositories.as_ref().map(Vec::len),
            "cached group"
        );
        let mut groups = self.groups.lock().await;
        groups.insert(group.key(), group);
    }

    /// Reads the record of a group, lets `merge` change it and stores the result, all under one
    /// lock.
    ///
    /// `merge` starts from an empty record if nothing valid is stored. Concurrent updates of the
    /// same group are applied one after another, none of them is lost.
    pub async fn update(&self, org: &str, team: &str, merge: impl FnOnce(&mut Group)) {
        let key = GroupKey::new(org, team);
        let mut groups = self.groups.lock().await;
        let mut group = match groups.remove(&key) {
            Some(group) if !self.is_expired(&group) => group,
            _ => Group::new(org, team),
        };
        merge(&mut group);
        group.refreshed_at = Some(Instant::now());
        trace!(
            group = %key,
            users = ?group.users.as_ref().map(Vec::len),
            repositories = ?group.repositories.as_ref().map(Vec::len),
            "updated cached group"
        );
        groups.insert(key, group);
    }

    /// Forgets members and repositories of a group, in the cache and in the given copy.
    pub async fn invalidate(&self, group: &mut Group) {
        group.clear();
        let mut groups = self.groups.lock().await;
        if let Some(stored) = groups.get_mut(&group.key()) {
            trace!(group = %stored.key(), "invalidated cached group");
            stored.clear();
        }
    }

    /// Number of unexpired records.
    pub async fn len(&self) -> usize {
        let groups = self.groups.lock().await;
        groups
            .values()
            .filter(|group| !self.is_expired(group))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

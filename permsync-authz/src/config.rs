// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration of a permission provider.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Default time-to-live of cached groups, in hours.
pub const DEFAULT_GROUPS_CACHE_TTL_HOURS: f64 = 72.0;

/// Configuration parameters for a code host permission provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Base URL of the code host, for example `https://github.com/`.
    pub url: Url,

    /// Base service token. Used for every listing which does not need to be answered from a
    /// specific user's perspective.
    #[serde(default)]
    pub token: String,

    /// How long cached organization and team affiliations stay valid, in hours. Zero or a
    /// negative value disables group caching: every fetch then lists all affiliations directly.
    #[serde(rename = "groupsCacheTTL", default = "default_groups_cache_ttl")]
    pub groups_cache_ttl: f64,
}

fn default_groups_cache_ttl() -> f64 {
    DEFAULT_GROUPS_CACHE_TTL_HOURS
}

impl ProviderConfig {
    pub fn new(url: Url, token: &str) -> Self {
        Self {
            url,
            token: token.to_string(),
            groups_cache_ttl: DEFAULT_GROUPS_CACHE_TTL_HOURS,
        }
    }

    /// Sets the group cache TTL in hours, zero or negative disables group caching.
    pub fn with_groups_cache_ttl(mut self, hours: f64) -> Self {
        self.groups_cache_ttl = hours;
        self
    }

    /// Returns the group cache TTL, `None` if group caching is disabled.
    pub fn groups_cache_ttl(&self) -> Option<Duration> {
        if !self.groups_cache_ttl.is_finite() || self.groups_cache_ttl <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(self.groups_cache_ttl * 60.0 * 60.0).ok()
    }
}

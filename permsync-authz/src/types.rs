// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use url::Url;

/// Service type of GitHub code hosts.
pub const SERVICE_TYPE_GITHUB: &str = "github";

/// Identifier of an account on the code host.
///
/// For GitHub this is the decimal representation of the numeric user id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for AccountId {
    fn from(database_id: i64) -> Self {
        Self(database_id.to_string())
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a repository on the code host (GitHub node id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(String);

impl RepoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A code host instance, identified by its service type and normalized base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeHost {
    pub service_type: String,
    pub service_id: String,
    pub base_url: Url,
}

impl CodeHost {
    pub fn new(base_url: &Url, service_type: &str) -> Self {
        let base_url = normalize_base_url(base_url);
        Self {
            service_type: service_type.to_string(),
            service_id: base_url.to_string(),
            base_url,
        }
    }

    pub fn hostname(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// Returns `true` if the account belongs to this code host.
    pub fn is_host_of_account(&self, spec: &AccountSpec) -> bool {
        self.service_type == spec.service_type && self.service_id == spec.service_id
    }

    /// Returns `true` if the repository belongs to this code host.
    pub fn is_host_of_repo(&self, spec: &ExternalRepoSpec) -> bool {
        self.service_type == spec.service_type && self.service_id == spec.service_id
    }
}

/// Base URLs always end in a slash and carry no query or fragment, so that service ids compare
/// equal no matter how the URL was configured.
fn normalize_base_url(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    pub service_type: String,
    pub service_id: String,
    pub account_id: String,
}

/// OAuth token stored with an external account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Opaque data stored with an external account.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    /// Authentication data, an encoded [`OAuthToken`] for GitHub accounts.
    #[serde(default)]
    pub auth_data: Option<serde_json::Value>,

    /// Code host profile data.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl AccountData {
    pub fn with_token(token: &OAuthToken) -> Result<Self, serde_json::Error> {
        Ok(Self {
            auth_data: Some(serde_json::to_value(token)?),
            data: None,
        })
    }

    /// Decodes the stored OAuth token, `None` if no authentication data was stored.
    pub fn oauth_token(&self) -> Result<Option<OAuthToken>, serde_json::Error> {
        match &self.auth_data {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone()).map(Some),
            _ => Ok(None),
        }
    }
}

/// An identity on the code host, linked to an internal user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: i32,
    pub spec: AccountSpec,
    pub data: AccountData,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalRepoSpec {
    pub id: RepoId,
    pub service_type: String,
    pub service_id: String,
}

/// A repository mirrored from the code host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRepository {
    pub spec: ExternalRepoSpec,

    /// `<hostname>/<owner>/<name>`.
    pub uri: String,
}

/// Repositories an account can read on the code host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUserPermissions {
    /// Ids of readable repositories, without duplicates.
    pub exacts: Vec<RepoId>,
}

/// Options for a single permission fetch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchPermsOptions {
    /// Invalidate every cached group touched during this fetch before using it.
    pub invalidate_caches: bool,
}

/// Splits `owner/name` into its parts.
pub(crate) fn split_name_with_owner(name_with_owner: &str) -> Option<(&str, &str)> {
    let (owner, name) = name_with_owner.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner, name))
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::{
        AccountData, AccountSpec, CodeHost, OAuthToken, SERVICE_TYPE_GITHUB, split_name_with_owner,
    };

    #[test]
    fn normalizes_service_id() {
        let host = CodeHost::new(
            &Url::parse("https://GitHub.example.com/api?x=1").unwrap(),
            SERVICE_TYPE_GITHUB,
        );
        assert_eq!(host.service_id, "https://github.example.com/api/");
        assert_eq!(host.hostname(), "github.example.com");

        let host = CodeHost::new(&Url::parse("https://github.com").unwrap(), SERVICE_TYPE_GITHUB);
        assert_eq!(host.service_id, "https://github.com/");
    }

    #[test]
    fn account_host_check() {
        let host = CodeHost::new(&Url::parse("https://github.com/").unwrap(), SERVICE_TYPE_GITHUB);
        let mut spec = AccountSpec {
            service_type: SERVICE_TYPE_GITHUB.into(),
            service_id: "https://github.com/".into(),
            account_id: "42".into(),
        };
        assert!(host.is_host_of_account(&spec));

        spec.service_id = "https://ghe.example.com/".into();
        assert!(!host.is_host_of_account(&spec));
    }

    #[test]
    fn splits_name_with_owner() {
        assert_eq!(split_name_with_owner("acme/web"), Some(("acme", "web")));
        assert_eq!(split_name_with_owner("acme"), None);
        assert_eq!(split_name_with_owner("/web"), None);
        assert_eq!(split_name_with_owner("acme/web/extra"), None);
    }

    #[test]
    fn decodes_oauth_token() {
        let token = OAuthToken {
            access_token: "secret".into(),
            token_type: Some("bearer".into()),
            refresh_token: None,
        };
        let data = AccountData::with_token(&token).unwrap();
        assert_eq!(data.oauth_token().unwrap(), Some(token));

        assert_eq!(AccountData::default().oauth_token().unwrap(), None);

        let broken = AccountData {
            auth_data: Some(serde_json::json!({ "token": 12 })),
            data: None,
        };
        assert!(broken.oauth_token().is_err());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

use url::Url;

use crate::{
    Account, AccountData, AccountSpec, ExternalRepoSpec, ExternalRepository, OAuthToken,
    ProviderConfig, RepoId, SERVICE_TYPE_GITHUB,
};

pub const SERVICE_ID: &str = "https://github.com/";

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

pub fn config(groups_cache_ttl_hours: f64) -> ProviderConfig {
    let url = Url::parse(SERVICE_ID).unwrap();
    ProviderConfig::new(url, "base-token").with_groups_cache_ttl(groups_cache_ttl_hours)
}

/// GitHub account with the given numeric id and access token.
pub fn account(account_id: i64, access_token: &str) -> Account {
    let token = OAuthToken {
        access_token: access_token.to_string(),
        token_type: Some("bearer".into()),
        refresh_token: None,
    };
    Account {
        user_id: 1,
        spec: AccountSpec {
            service_type: SERVICE_TYPE_GITHUB.into(),
            service_id: SERVICE_ID.into(),
            account_id: account_id.to_string(),
        },
        data: AccountData::with_token(&token).unwrap(),
    }
}

pub fn repository(id: &str, name_with_owner: &str) -> ExternalRepository {
    ExternalRepository {
        spec: ExternalRepoSpec {
            id: RepoId::new(id),
            service_type: SERVICE_TYPE_GITHUB.into(),
            service_id: SERVICE_ID.into(),
        },
        uri: format!("github.com/{name_with_owner}"),
    }
}

pub fn repo_ids(ids: &[&str]) -> Vec<RepoId> {
    ids.iter().map(|id| RepoId::new(*id)).collect()
}

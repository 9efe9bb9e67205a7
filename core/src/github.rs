//! Repository data collaborator: the GitHub REST API client.
//!
//! Fetches are plain request/response; callers decide what to cache. The
//! client keeps passive rate-limit counters from response headers so the UI
//! can display remaining quota and compute a retry-after hint.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::error::ExploreError;
use crate::state::RepoInfo;
use crate::tree::{build_tree, FileNode, NodeKind, TreeEntry};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("gitscope/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitStatus {
    pub remaining: Option<u64>,
    pub reset_epoch: Option<u64>,
}

impl RateLimitStatus {
    pub fn reset_in_secs(&self) -> Option<u64> {
        self.reset_epoch
            .map(|reset| reset.saturating_sub(crate::cache::now_secs()))
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Repository snapshot as cached and handed to the state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    pub info: RepoInfo,
    pub tree: FileNode,
}

/// Landing-page suggestion, from the search API's most-starred listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingRepo {
    pub full_name: String,
    pub description: Option<String>,
    pub stars: u64,
}

pub struct RepoClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
    rate: Mutex<RateLimitStatus>,
}

impl RepoClient {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into(),
            token,
            rate: Mutex::new(RateLimitStatus::default()),
        }
    }

    /// Default client; an optional `GITHUB_TOKEN` raises the quota.
    pub fn from_env() -> Self {
        Self::new(DEFAULT_API_BASE, std::env::var("GITHUB_TOKEN").ok())
    }

    pub fn rate_limit(&self) -> RateLimitStatus {
        self.rate.lock().map(|r| *r).unwrap_or_default()
    }

    pub async fn fetch_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepoSnapshot, ExploreError> {
        let meta: RepoResponse = self
            .get_json(&format!("{}/repos/{owner}/{repo}", self.base))
            .await?;

        let listing: TreeResponse = self
            .get_json(&format!(
                "{}/repos/{owner}/{repo}/git/trees/{}?recursive=1",
                self.base, meta.default_branch
            ))
            .await?;

        if listing.truncated {
            tracing::warn!(owner, repo, "tree listing truncated by the API");
        }

        let entries: Vec<TreeEntry> = listing
            .tree
            .into_iter()
            .filter_map(|item| {
                let kind = match item.kind.as_str() {
                    "blob" => NodeKind::File,
                    "tree" => NodeKind::Folder,
                    _ => return None, // submodules, symlinks
                };
                Some(TreeEntry {
                    path: item.path,
                    kind,
                    size: item.size,
                })
            })
            .collect();

        let tree = build_tree(&meta.name, &entries);
        let info = RepoInfo {
            owner: meta.owner.login,
            repo: meta.name,
            full_name: meta.full_name,
            description: meta.description,
            stars: meta.stargazers_count,
            forks: meta.forks_count,
            language: meta.language,
            default_branch: meta.default_branch,
            html_url: meta.html_url,
        };

        Ok(RepoSnapshot { info, tree })
    }

    pub async fn fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, ExploreError> {
        let content: ContentResponse = self
            .get_json(&format!(
                "{}/repos/{owner}/{repo}/contents/{path}",
                self.base
            ))
            .await
            .map_err(|e| match e {
                // the detail panel treats every content failure the same way
                ExploreError::RateLimited { .. } => e,
                other => ExploreError::service(other.to_string()),
            })?;

        match content.content {
            Some(encoded) if content.encoding.as_deref() == Some("base64") => {
                let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
                let bytes = BASE64
                    .decode(compact)
                    .map_err(|e| ExploreError::service(format!("undecodable content: {e}")))?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Some(raw) => Ok(raw),
            None => Err(ExploreError::service("file has no inline content")),
        }
    }

    pub async fn fetch_trending(&self, count: usize) -> Result<Vec<TrendingRepo>, ExploreError> {
        let listing: SearchResponse = self
            .get_json(&format!(
                "{}/search/repositories?q=stars:%3E10000&sort=stars&order=desc&per_page={count}",
                self.base
            ))
            .await?;

        Ok(listing
            .items
            .into_iter()
            .map(|item| TrendingRepo {
                full_name: item.full_name,
                description: item.description,
                stars: item.stargazers_count,
            })
            .collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ExploreError> {
        let mut request = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExploreError::service(format!("network error: {e}")))?;

        self.record_rate(response.headers());

        let status = response.status();
        if !status.is_success() {
            return Err(self.error_for(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ExploreError::service(format!("unexpected response: {e}")))
    }

    fn record_rate(&self, headers: &reqwest::header::HeaderMap) {
        let parse = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        if let Ok(mut rate) = self.rate.lock() {
            if let Some(remaining) = parse("x-ratelimit-remaining") {
                rate.remaining = Some(remaining);
            }
            if let Some(reset) = parse("x-ratelimit-reset") {
                rate.reset_epoch = Some(reset);
            }
        }
    }

    fn error_for(&self, status: reqwest::StatusCode) -> ExploreError {
        let rate = self.rate_limit();

        if status == reqwest::StatusCode::NOT_FOUND {
            return ExploreError::NotFound;
        }

        if (status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS)
            && rate.exhausted()
        {
            return ExploreError::RateLimited {
                reset_in_secs: rate.reset_in_secs().unwrap_or(60),
            };
        }

        ExploreError::service(format!("repository API returned {status}"))
    }
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    full_name: String,
    description: Option<String>,
    stargazers_count: u64,
    forks_count: u64,
    language: Option<String>,
    default_branch: String,
    html_url: String,
    owner: OwnerResponse,
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItemResponse>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItemResponse {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItemResponse>,
}

#[derive(Debug, Deserialize)]
struct SearchItemResponse {
    full_name: String,
    description: Option<String>,
    stargazers_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_reset_hint() {
        let status = RateLimitStatus {
            remaining: Some(0),
            reset_epoch: Some(crate::cache::now_secs() + 120),
        };
        assert!(status.exhausted());
        let reset = status.reset_in_secs().unwrap();
        assert!((118..=120).contains(&reset));
    }

    #[test]
    fn test_tree_item_kinds_map() {
        let listing: TreeResponse = serde_json::from_str(
            r#"{"tree":[
                {"path":"src","type":"tree"},
                {"path":"src/main.rs","type":"blob","size":99},
                {"path":"module","type":"commit"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(listing.tree.len(), 3);
        assert!(!listing.truncated);
        assert_eq!(listing.tree[1].size, Some(99));
    }
}

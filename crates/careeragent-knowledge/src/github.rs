//! GitHub repository discovery

use crate::error::{KnowledgeError, KnowledgeResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const PER_PAGE: usize = 100;
const USER_AGENT: &str = concat!("careeragent/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct RepoEntry {
    full_name: Option<String>,
}

/// Minimal client for the GitHub REST API.
pub struct GithubClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

impl GithubClient {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> KnowledgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// All repositories owned by the token's user, most recently updated
    /// first, as `owner/name`.
    pub async fn discover_repositories(&self) -> KnowledgeResult<Vec<String>> {
        let url = format!("{}/user/repos", self.api_url);
        let mut repos = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("token {}", self.token))
                .header("Accept", "application/vnd.github.v3+json")
                .query(&[
                    ("affiliation", "owner".to_string()),
                    ("sort", "updated".to_string()),
                    ("per_page", PER_PAGE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let body: String = body.chars().take(200).collect();
                return Err(KnowledgeError::Github(format!("{}: {}", status, body)));
            }

            let entries: Vec<RepoEntry> = response.json().await?;
            debug!("GitHub page {}: {} repositories", page, entries.len());
            let count = entries.len();
            repos.extend(entries.into_iter().filter_map(|e| e.full_name));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        info!("Discovered {} repositories on GitHub", repos.len());
        Ok(repos)
    }
}

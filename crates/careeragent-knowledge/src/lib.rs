//! Careeragent Knowledge - the profile and repository snapshots the agent
//! answers from
//!
//! Everything is loaded once at startup by [`load_store`]; afterwards the
//! [`KnowledgeStore`] is read-only.

pub mod error;
pub mod fetch;
pub mod github;
pub mod profile;
pub mod snapshot;
pub mod store;

pub use error::{KnowledgeError, KnowledgeResult};
pub use fetch::{load_repositories, GitFetcher, RepositoryFetcher};
pub use github::GithubClient;
pub use profile::Profile;
pub use snapshot::{extract_snapshot, normalize_path, RepositorySnapshot};
pub use store::KnowledgeStore;

use careeragent_core::{AppConfig, GithubConfig};
use std::time::Duration;
use tracing::{info, warn};

/// Repositories to load: the explicit list if one is configured, otherwise
/// whatever the token's owner has on GitHub. Discovery failures are logged
/// and yield nothing.
pub async fn resolve_repository_ids(config: &GithubConfig) -> Vec<String> {
    if !config.repos.is_empty() {
        return config.repos.clone();
    }
    let Some(token) = config.token.as_deref() else {
        info!("GITHUB_TOKEN not set, skipping repository loading");
        return Vec::new();
    };

    let client = match GithubClient::new(token, &config.api_url) {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not create GitHub client: {}", e);
            return Vec::new();
        }
    };
    match client.discover_repositories().await {
        Ok(repos) => repos,
        Err(e) => {
            warn!("Could not auto-fetch repositories: {}", e);
            Vec::new()
        }
    }
}

/// Load the profile (fatal on failure) and every reachable repository
/// (best-effort) with the given fetcher.
pub async fn load_store_with(config: &AppConfig, fetcher: &dyn RepositoryFetcher) -> KnowledgeResult<KnowledgeStore> {
    let profile = Profile::load(&config.profile)?;
    let repos = resolve_repository_ids(&config.github).await;
    let snapshots = if repos.is_empty() {
        Vec::new()
    } else {
        load_repositories(fetcher, &repos, config.github.max_concurrent_clones).await
    };
    Ok(KnowledgeStore::new(profile, snapshots))
}

/// [`load_store_with`] using `git clone` against GitHub.
pub async fn load_store(config: &AppConfig) -> KnowledgeResult<KnowledgeStore> {
    let fetcher = GitFetcher::new(
        config.github.token.clone(),
        Duration::from_secs(config.github.clone_timeout_secs),
    );
    load_store_with(config, &fetcher).await
}

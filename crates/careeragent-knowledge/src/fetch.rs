//! Fetching repositories and turning them into snapshots

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::snapshot::{extract_snapshot, RepositorySnapshot};
use futures::StreamExt;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Produces the snapshot of one repository.
#[async_trait::async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(&self, repo: &str) -> KnowledgeResult<RepositorySnapshot>;
}

/// Shallow-clones with the `git` CLI into a temporary directory, extracts a
/// snapshot and removes the checkout.
pub struct GitFetcher {
    token: Option<String>,
    host: String,
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        Self {
            token,
            host: "https://github.com".into(),
            timeout,
        }
    }

    /// Clone from another host, e.g. `file:///srv/git` in tests.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    fn clone_url(&self, repo: &str) -> String {
        match (&self.token, self.host.strip_prefix("https://")) {
            (Some(token), Some(rest)) => format!("https://{}@{}/{}.git", token, rest, repo),
            _ => format!("{}/{}.git", self.host, repo),
        }
    }

    fn redact(&self, text: &str) -> String {
        match &self.token {
            Some(token) if !token.is_empty() => text.replace(token.as_str(), "***"),
            _ => text.to_string(),
        }
    }
}

/// `owner/name` with no empty, dot-only or option-like parts.
fn validate_repo_id(repo: &str) -> KnowledgeResult<()> {
    let parts: Vec<&str> = repo.split('/').collect();
    let valid = parts.len() == 2
        && parts.iter().all(|p| {
            !p.is_empty() && *p != "." && *p != ".." && !p.starts_with('-') && !p.contains(char::is_whitespace)
        });
    if valid {
        Ok(())
    } else {
        Err(KnowledgeError::InvalidRepository(repo.to_string()))
    }
}

#[async_trait::async_trait]
impl RepositoryFetcher for GitFetcher {
    async fn fetch(&self, repo: &str) -> KnowledgeResult<RepositorySnapshot> {
        validate_repo_id(repo)?;

        let workdir = tempfile::Builder::new().prefix("careeragent-").tempdir()?;
        let target = workdir.path().join(repo.replace('/', "_"));
        debug!("Cloning {} into {}", repo, target.display());

        let mut cmd = tokio::process::Command::new("git");
        cmd.args(["clone", "--depth", "1", "--quiet"])
            .arg(self.clone_url(repo))
            .arg(&target)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| KnowledgeError::CloneTimeout {
                repo: repo.to_string(),
                secs: self.timeout.as_secs(),
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(KnowledgeError::CloneFailed {
                repo: repo.to_string(),
                reason: self.redact(stderr.trim()),
            });
        }

        let id = repo.to_string();
        let snapshot = tokio::task::spawn_blocking(move || {
            let snapshot = extract_snapshot(&id, &target);
            drop(workdir);
            snapshot
        })
        .await
        .map_err(|e| KnowledgeError::CloneFailed {
            repo: repo.to_string(),
            reason: format!("snapshot task failed: {}", e),
        })??;

        Ok(snapshot)
    }
}

/// Fetch every repository, at most `concurrency` at a time. Failures are
/// logged and skipped. The result is sorted by repository id.
pub async fn load_repositories(
    fetcher: &dyn RepositoryFetcher,
    repos: &[String],
    concurrency: usize,
) -> Vec<RepositorySnapshot> {
    let results: Vec<(&String, KnowledgeResult<RepositorySnapshot>)> =
        futures::stream::iter(repos.iter().map(|repo| async move { (repo, fetcher.fetch(repo).await) }))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    let mut snapshots = Vec::with_capacity(results.len());
    for (repo, result) in results {
        match result {
            Ok(snapshot) => {
                debug!("Loaded {} ({} files)", repo, snapshot.files().len());
                snapshots.push(snapshot);
            }
            Err(e) => warn!("Skipping repository {}: {}", repo, e),
        }
    }
    snapshots.sort_by(|a, b| a.id().cmp(b.id()));

    info!("Loaded {}/{} repositories", snapshots.len(), repos.len());
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_ids_are_validated() {
        assert!(validate_repo_id("ada/engine").is_ok());
        assert!(validate_repo_id("ada").is_err());
        assert!(validate_repo_id("ada/../x").is_err());
        assert!(validate_repo_id("ada/--upload-pack=x").is_err());
        assert!(validate_repo_id("ada/ engine").is_err());
    }

    #[test]
    fn clone_url_embeds_token_only_for_https() {
        let fetcher = GitFetcher::new(Some("ghp_secret".into()), Duration::from_secs(1));
        assert_eq!(fetcher.clone_url("ada/engine"), "https://ghp_secret@github.com/ada/engine.git");

        let local = GitFetcher::new(Some("ghp_secret".into()), Duration::from_secs(1)).with_host("file:///srv/git/");
        assert_eq!(local.clone_url("ada/engine"), "file:///srv/git/ada/engine.git");

        assert_eq!(fetcher.redact("fatal: https://ghp_secret@github.com"), "fatal: https://***@github.com");
    }
}

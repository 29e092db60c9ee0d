//! Read-only lookups over the profile and repository snapshots

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::profile::Profile;
use crate::snapshot::{normalize_path, RepositorySnapshot};
use globset::{GlobBuilder, GlobMatcher};
use std::collections::BTreeMap;
use tracing::debug;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// How a listing pattern selects file names.
enum NameFilter {
    All,
    Glob(GlobMatcher),
    /// Lowercased substring of the file name, for patterns without wildcards.
    Contains(String),
}

impl NameFilter {
    fn parse(pattern: &str) -> KnowledgeResult<Self> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(Self::All);
        }
        if !pattern.contains(GLOB_META) {
            return Ok(Self::Contains(pattern.to_lowercase()));
        }
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|e| KnowledgeError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::Glob(glob.compile_matcher()))
    }

    fn keeps(&self, relative: &str, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Glob(m) => m.is_match(relative) || m.is_match(name),
            Self::Contains(needle) => name.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Everything the agent knows about its owner. Built once at startup and
/// shared immutably afterwards.
#[derive(Clone, Debug)]
pub struct KnowledgeStore {
    profile: Profile,
    repositories: BTreeMap<String, RepositorySnapshot>,
}

impl KnowledgeStore {
    pub fn new(profile: Profile, repositories: impl IntoIterator<Item = RepositorySnapshot>) -> Self {
        let repositories = repositories
            .into_iter()
            .map(|snap| (snap.id().to_string(), snap))
            .collect();
        Self { profile, repositories }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Repository identifiers in sorted order.
    pub fn repository_ids(&self) -> Vec<&str> {
        self.repositories.keys().map(String::as_str).collect()
    }

    pub fn repository(&self, repo: &str) -> KnowledgeResult<&RepositorySnapshot> {
        self.repositories.get(repo).ok_or_else(|| {
            KnowledgeError::repo_not_found(repo, self.repositories.keys().cloned().collect())
        })
    }

    /// Content of a captured file.
    pub fn get_repository_file(&self, repo: &str, path: &str) -> KnowledgeResult<&str> {
        let snapshot = self.repository(repo)?;
        let path = normalize_path(path)?;

        if let Some(content) = snapshot.file(&path) {
            return Ok(content);
        }
        if snapshot.contains_path(&path) {
            return Err(KnowledgeError::ContentNotLoaded { repo: repo.to_string(), path });
        }
        Err(KnowledgeError::FileNotFound { repo: repo.to_string(), path })
    }

    /// Paths under `dir` selected by `pattern`, sorted. A pattern with
    /// wildcards is a glob over the dir-relative path or the file name; a
    /// plain word matches file names containing it, ignoring case. An empty
    /// pattern matches everything.
    pub fn list_repository_files(&self, repo: &str, dir: &str, pattern: &str) -> KnowledgeResult<Vec<String>> {
        let snapshot = self.repository(repo)?;
        let dir = normalize_path(dir)?;
        let filter = NameFilter::parse(pattern)?;

        if !snapshot.contains_dir(&dir) {
            return Err(KnowledgeError::DirectoryNotFound { repo: repo.to_string(), dir });
        }

        let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };

        let matches: Vec<String> = snapshot
            .tree()
            .iter()
            .filter_map(|path| {
                let relative = path.strip_prefix(prefix.as_str())?;
                let name = relative.rsplit('/').next().unwrap_or(relative);
                filter.keeps(relative, name).then(|| path.clone())
            })
            .collect();

        debug!("list {}/{} '{}' -> {} paths", repo, dir, pattern, matches.len());
        Ok(matches)
    }
}

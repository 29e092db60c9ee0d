//! Knowledge store error types

use std::path::PathBuf;

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("repository '{repo}' not found")]
    RepoNotFound { repo: String, available: Vec<String> },

    #[error("file not found in {repo}: {path}")]
    FileNotFound { repo: String, path: String },

    #[error("{path} exists in {repo} but only README and development-log files are loaded")]
    ContentNotLoaded { repo: String, path: String },

    #[error("directory not found in {repo}: {dir}")]
    DirectoryNotFound { repo: String, dir: String },

    #[error("invalid path (path traversal attempt): {0}")]
    InvalidPath(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("cannot read profile file {}: {source}", .path.display())]
    ProfileMissing {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot extract text from {}: {reason}", .path.display())]
    ProfileUnreadable { path: PathBuf, reason: String },

    #[error("profile file is empty: {}", .path.display())]
    ProfileEmpty { path: PathBuf },

    #[error("invalid repository identifier '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("cloning {repo} failed: {reason}")]
    CloneFailed { repo: String, reason: String },

    #[error("cloning {repo} timed out after {secs}s")]
    CloneTimeout { repo: String, secs: u64 },

    #[error("GitHub API error: {0}")]
    Github(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl KnowledgeError {
    pub fn repo_not_found(repo: impl Into<String>, available: Vec<String>) -> Self {
        Self::RepoNotFound { repo: repo.into(), available }
    }
}

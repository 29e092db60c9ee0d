//! Repository snapshots: the few files kept in memory from a checkout

use crate::error::{KnowledgeError, KnowledgeResult};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Directories never walked. Hidden directories (`.git`, `.venv`, ...) are
/// skipped as well.
pub const SKIP_DIRS: &[&str] = &["node_modules", "__pycache__", "venv", "dist", "build", "target", "out"];

/// Build artefacts never listed or read.
pub const SKIP_EXTENSIONS: &[&str] = &["pyc", "pyo", "so", "dylib", "dll", "exe", "bin"];

const README_MARKERS: &[&str] = &["readme"];
const DEV_LOG_MARKERS: &[&str] = &["development", "dev_log", "changelog", "changes", "history"];
const DEV_LOG_EXTENSIONS: &[&str] = &["md", "txt", "rst", "markdown"];

/// README and dev-log files kept per repository, each.
pub const MAX_FILES_PER_KIND: usize = 2;

/// Upper bound on the recorded path tree.
pub const MAX_TREE_ENTRIES: usize = 5000;

/// In-memory copy of one repository.
///
/// `files` holds the captured README and development-log contents keyed by
/// repository-relative path. `tree` lists the paths seen at clone time and
/// always contains the keys of `files`. When the checkout had more than
/// [`MAX_TREE_ENTRIES`] paths the tree is a subset and `is_truncated` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositorySnapshot {
    id: String,
    files: BTreeMap<String, String>,
    tree: Vec<String>,
    truncated: bool,
}

impl RepositorySnapshot {
    pub fn new(id: impl Into<String>, files: BTreeMap<String, String>) -> Self {
        let tree = files.keys().cloned().collect();
        Self {
            id: id.into(),
            files,
            tree,
            truncated: false,
        }
    }

    /// Mark the tree as cut short.
    pub fn with_truncated(mut self, truncated: bool) -> Self {
        self.truncated = truncated;
        self
    }

    /// Add paths whose contents were not captured.
    pub fn with_tree(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.tree.extend(paths);
        self.tree.sort();
        self.tree.dedup();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Sorted repository-relative paths.
    pub fn tree(&self) -> &[String] {
        &self.tree
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.tree.binary_search_by(|p| p.as_str().cmp(path)).is_ok()
    }

    /// Whether some paths of the checkout were left out of `tree`.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Whether `dir` (normalized, `""` for the root) holds any recorded path.
    pub fn contains_dir(&self, dir: &str) -> bool {
        if dir.is_empty() {
            return true;
        }
        let prefix = format!("{}/", dir);
        let start = self.tree.partition_point(|p| p.as_str() < prefix.as_str());
        self.tree.get(start).is_some_and(|p| p.starts_with(&prefix))
    }
}

/// Normalize a repository-relative path: `./a//b` becomes `a/b`, the empty
/// string and `.` become the root. `..` components are rejected.
pub fn normalize_path(path: &str) -> KnowledgeResult<String> {
    let mut parts = Vec::new();
    for part in path.split(&['/', '\\'][..]) {
        match part {
            "" | "." => {}
            ".." => return Err(KnowledgeError::InvalidPath(path.to_string())),
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&&*name)
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn is_skipped_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| SKIP_EXTENSIONS.contains(&ext.as_str()))
}

fn depth(path: &str) -> usize {
    path.matches('/').count()
}

/// Pick up to [`MAX_FILES_PER_KIND`] paths whose lowercased file name contains
/// one of `markers`, root-level files first.
fn select(paths: &[String], markers: &[&str], extensions: Option<&[&str]>) -> Vec<String> {
    let mut found: Vec<&String> = paths
        .iter()
        .filter(|p| {
            let name = p.rsplit('/').next().unwrap_or(p.as_str()).to_lowercase();
            let ext_ok = match extensions {
                Some(exts) => extension(&name).is_some_and(|e| exts.contains(&e.as_str())),
                None => true,
            };
            ext_ok && markers.iter().any(|m| name.contains(m))
        })
        .collect();
    found.sort_by(|a, b| (depth(a), a.as_str()).cmp(&(depth(b), b.as_str())));
    found.into_iter().take(MAX_FILES_PER_KIND).cloned().collect()
}

/// Read the selected files as text. A file that cannot be read is logged and
/// left out; blank files are dropped.
fn read_captured(id: &str, root: &Path, wanted: Vec<String>) -> BTreeMap<String, String> {
    let mut files = BTreeMap::new();
    for path in wanted {
        let bytes = match std::fs::read(root.join(&path)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("{}: skipping unreadable {}: {}", id, path, e);
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes).into_owned();
        if !text.trim().is_empty() {
            files.insert(path, text);
        }
    }
    files
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Keep at most `limit` of the sorted `paths`, taking the first file of every
/// directory before the second of any, so no directory is crowded out by a
/// large sibling. Shallower paths win ties. Returns whether anything was cut.
fn cap_tree(paths: &mut Vec<String>, limit: usize) -> bool {
    if paths.len() <= limit {
        return false;
    }
    let mut kept: Vec<String> = {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut ranked: Vec<(usize, usize, &String)> = paths
            .iter()
            .map(|p| {
                let rank = seen.entry(parent(p)).or_insert(0);
                *rank += 1;
                (*rank, depth(p), p)
            })
            .collect();
        ranked.sort();
        ranked.into_iter().take(limit).map(|(_, _, p)| p.clone()).collect()
    };
    kept.sort();
    *paths = kept;
    true
}

/// Walk a checked-out repository and build its snapshot.
pub fn extract_snapshot(id: &str, root: &Path) -> KnowledgeResult<RepositorySnapshot> {
    let mut paths = Vec::new();

    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_skipped_file(&name) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let rel: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
        paths.push(rel.join("/"));
    }
    paths.sort();

    let mut wanted = select(&paths, README_MARKERS, None);
    wanted.extend(select(&paths, DEV_LOG_MARKERS, Some(DEV_LOG_EXTENSIONS)));

    let files = read_captured(id, root, wanted);

    let total = paths.len();
    let truncated = cap_tree(&mut paths, MAX_TREE_ENTRIES);
    if truncated {
        warn!("{}: tree has {} entries, keeping {}", id, total, MAX_TREE_ENTRIES);
    }

    debug!("{}: captured {} files, {} paths", id, files.len(), paths.len());
    Ok(RepositorySnapshot::new(id, files)
        .with_tree(paths)
        .with_truncated(truncated))
}

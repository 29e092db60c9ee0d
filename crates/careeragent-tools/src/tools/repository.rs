//! Repository tools: read captured files and list the tree of a snapshot

use crate::registry::{parse_args, Tool, ToolCallError, ToolOutput};
use careeragent_knowledge::snapshot::MAX_TREE_ENTRIES;
use careeragent_knowledge::{KnowledgeError, KnowledgeStore};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Entries shown by `list_repo_files` before the listing is cut.
pub const MAX_LISTED_FILES: usize = 200;

/// Model-facing text for a failed lookup.
fn describe(err: &KnowledgeError) -> String {
    match err {
        KnowledgeError::RepoNotFound { repo, available } => {
            let available = if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            };
            format!("Repository '{}' not found. Available repositories: {}", repo, available)
        }
        KnowledgeError::FileNotFound { repo, path } => format!("File not found in {}: {}", repo, path),
        KnowledgeError::DirectoryNotFound { repo, dir } => {
            format!("Directory not found in {}: {}", repo, dir)
        }
        KnowledgeError::ContentNotLoaded { repo, path } => format!(
            "{} exists in {} but only README and development-log files are loaded; \
             use list_repo_files to see the rest of the structure",
            path, repo
        ),
        other => other.to_string(),
    }
}

pub struct ReadRepoFileTool {
    knowledge: Arc<KnowledgeStore>,
}

impl ReadRepoFileTool {
    pub fn new(knowledge: Arc<KnowledgeStore>) -> Self {
        Self { knowledge }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ReadArgs {
    #[serde(alias = "repo_name")]
    repo: String,
    #[serde(alias = "file_path")]
    path: String,
}

#[async_trait::async_trait]
impl Tool for ReadRepoFileTool {
    fn name(&self) -> &str { "read_repo_file" }

    fn description(&self) -> &str {
        "Read a file from one of the private GitHub repositories. Use this AFTER \
         list_repo_files to read README or development-log files for details \
         about a specific project."
    }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo": {
                    "type": "string",
                    "description": "Repository in owner/name format, e.g. \"username/project\""
                },
                "path": {
                    "type": "string",
                    "description": "Path relative to the repository root, e.g. \"README.md\""
                }
            },
            "required": ["repo", "path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolCallError> {
        let args: ReadArgs = parse_args(self.name(), args)?;
        debug!("read_repo_file {} {}", args.repo, args.path);

        Ok(match self.knowledge.get_repository_file(args.repo.trim(), &args.path) {
            Ok(content) => ToolOutput::text(content),
            Err(e) => ToolOutput::error(describe(&e)),
        })
    }
}

pub struct ListRepoFilesTool {
    knowledge: Arc<KnowledgeStore>,
}

impl ListRepoFilesTool {
    pub fn new(knowledge: Arc<KnowledgeStore>) -> Self {
        Self { knowledge }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ListArgs {
    #[serde(alias = "repo_name")]
    repo: String,
    #[serde(default, alias = "directory")]
    dir: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
}

#[async_trait::async_trait]
impl Tool for ListRepoFilesTool {
    fn name(&self) -> &str { "list_repo_files" }

    fn description(&self) -> &str {
        "List files in one of the private GitHub repositories, optionally under a \
         directory and filtered by a glob pattern. ALWAYS use this FIRST when asked \
         about private projects to see what exists before reading files."
    }

    fn is_read_only(&self) -> bool { true }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "repo": {
                    "type": "string",
                    "description": "Repository in owner/name format"
                },
                "dir": {
                    "type": "string",
                    "description": "Directory relative to the repository root (default: root)"
                },
                "pattern": {
                    "type": "string",
                    "description": "Glob to filter files, e.g. \"*.md\", \"README*\"; a plain word matches \
                                    file names containing it (default: all files)"
                }
            },
            "required": ["repo"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolCallError> {
        let args: ListArgs = parse_args(self.name(), args)?;
        let repo = args.repo.trim();
        let dir = args.dir.unwrap_or_default();
        let pattern = args.pattern.unwrap_or_default();

        let files = match self.knowledge.list_repository_files(repo, &dir, &pattern) {
            Ok(files) => files,
            Err(e) => return Ok(ToolOutput::error(describe(&e))),
        };
        debug!("list_repo_files {} '{}' '{}' -> {}", repo, dir, pattern, files.len());

        let truncated = self
            .knowledge
            .repository(repo)
            .is_ok_and(|snapshot| snapshot.is_truncated());

        let mut lines: Vec<String> = if files.is_empty() {
            let shown = if dir.is_empty() { "." } else { dir.as_str() };
            vec![format!("No files found in {}/{}", repo, shown)]
        } else {
            let total = files.len();
            let mut lines: Vec<String> = files.into_iter().take(MAX_LISTED_FILES).collect();
            if total > MAX_LISTED_FILES {
                lines.push(format!("... (showing first {} of {} files)", MAX_LISTED_FILES, total));
            }
            lines
        };
        if truncated {
            lines.push(format!(
                "... (repository has more than {} files; some are not listed)",
                MAX_TREE_ENTRIES
            ));
        }
        Ok(ToolOutput::text(lines.join("\n")))
    }
}

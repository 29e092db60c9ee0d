//! Careeragent Tools - the functions the model may call
//!
//! Each tool is a self-contained file in src/tools/. The set the agent sees
//! is fixed by [`create_career_registry`].

pub mod registry;
pub mod tools;

pub use registry::{parse_args, Tool, ToolCallError, ToolOutput, ToolRegistry, ToolResult, DEFAULT_MAX_RESULT_CHARS};
pub use tools::contact::{RecordUnknownQuestionTool, RecordUserDetailsTool};
pub use tools::repository::{ListRepoFilesTool, ReadRepoFileTool, MAX_LISTED_FILES};

use careeragent_knowledge::KnowledgeStore;
use careeragent_notify::Notifier;
use std::sync::Arc;

/// The four career tools: two that notify the owner and two that read the
/// repository snapshots.
pub fn create_career_registry(knowledge: Arc<KnowledgeStore>, notifier: Arc<dyn Notifier>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    // --- Contact tools ---
    registry.register(RecordUserDetailsTool::new(notifier.clone()));
    registry.register(RecordUnknownQuestionTool::new(notifier));

    // --- Repository tools (read-only) ---
    registry.register(ListRepoFilesTool::new(knowledge.clone()));
    registry.register(ReadRepoFileTool::new(knowledge));

    registry
}

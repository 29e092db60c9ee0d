//! Tests for careeragent-tools: ToolOutput, ToolRegistry validation and the
//! four career tools against an in-memory knowledge store

use careeragent_core::{Role, ToolCall};
use careeragent_knowledge::snapshot::MAX_TREE_ENTRIES;
use careeragent_knowledge::{KnowledgeStore, Profile, RepositorySnapshot};
use careeragent_notify::{Notifier, NotifyError};
use careeragent_tools::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str { "recording" }

    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str { "failing" }

    async fn notify(&self, _message: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected { status: 500, body: "down".into() })
    }
}

fn knowledge() -> Arc<KnowledgeStore> {
    let mut files = BTreeMap::new();
    files.insert("README.md".to_string(), "# Engine\n\nA toy LSM tree.".to_string());
    let engine = RepositorySnapshot::new("ada/engine", files)
        .with_tree(["src/main.rs", "docs/design.md"].map(String::from));

    let big = RepositorySnapshot::new("ada/big", BTreeMap::new())
        .with_tree((0..250).map(|i| format!("src/f{:03}.rs", i)));

    Arc::new(KnowledgeStore::new(Profile::new("Ada", "summary", "document"), vec![engine, big]))
}

fn registry_with(notifier: Arc<dyn Notifier>) -> ToolRegistry {
    create_career_registry(knowledge(), notifier)
}

fn call(name: &str, args: Value) -> ToolCall {
    ToolCall::new("call_1", name, args)
}

// ===========================================================================
// ToolOutput / ToolResult
// ===========================================================================

#[test]
fn tool_output_text() {
    let r = ToolOutput::text("hello");
    assert!(!r.is_error());
    assert_eq!(r.to_content_string(), "hello");
}

#[test]
fn tool_output_error() {
    let r = ToolOutput::error("boom");
    assert!(r.is_error());
    assert_eq!(r.to_content_string(), "Error: boom");
}

#[tokio::test]
async fn tool_result_into_message_links_call() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&ToolCall::new("call_42", "record_unknown_question", json!({"question": "q"})))
        .await;
    let msg = result.into_message();
    assert_eq!(msg.role, Role::Tool);
    assert_eq!(msg.tool_call_id.as_deref(), Some("call_42"));
    assert_eq!(msg.name.as_deref(), Some("record_unknown_question"));
    assert_eq!(msg.content, "ok");
}

// ===========================================================================
// ToolRegistry
// ===========================================================================

#[test]
fn registry_default_is_empty() {
    let reg = ToolRegistry::new();
    assert!(reg.list().is_empty());
    assert!(reg.get_definitions().is_empty());
}

#[test]
fn career_registry_has_exactly_four_tools() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    assert_eq!(
        reg.list(),
        vec!["list_repo_files", "read_repo_file", "record_unknown_question", "record_user_details"]
    );
    assert_eq!(reg.list_read_only(), vec!["list_repo_files", "read_repo_file"]);

    for def in reg.get_definitions() {
        assert_eq!(def.input_schema["type"], "object", "{} schema", def.name);
        assert!(!def.description.is_empty());
    }
}

#[tokio::test]
async fn unknown_tool_is_typed_error_result() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    assert!(matches!(
        reg.validate(&call("delete_everything", json!({}))),
        Err(ToolCallError::UnknownTool(name)) if name == "delete_everything"
    ));

    let result = reg.execute(&call("delete_everything", json!({}))).await;
    assert!(result.is_error);
    assert_eq!(result.call_id, "call_1");
    assert!(result.content.contains("Tool not found: delete_everything"));
}

#[tokio::test]
async fn non_object_arguments_are_rejected() {
    let notifier = Arc::new(RecordingNotifier::default());
    let reg = registry_with(notifier.clone());

    assert!(matches!(
        reg.validate(&call("record_unknown_question", json!("{not json"))),
        Err(ToolCallError::InvalidArguments { .. })
    ));
    let result = reg.execute(&call("record_unknown_question", json!([1, 2]))).await;
    assert!(result.is_error);
    assert!(result.content.contains("expected a JSON object"));
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn missing_required_field_is_rejected_without_side_effects() {
    let notifier = Arc::new(RecordingNotifier::default());
    let reg = registry_with(notifier.clone());

    let result = reg.execute(&call("record_user_details", json!({"name": "Bob"}))).await;
    assert!(result.is_error);
    assert!(result.content.contains("Invalid arguments for record_user_details"));
    assert!(result.content.contains("email"));

    let result = reg.execute(&call("record_unknown_question", json!({"question": 7}))).await;
    assert!(result.is_error);
    assert!(notifier.sent().is_empty());
}

struct PanickingTool;

#[async_trait::async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str { "explode" }
    fn description(&self) -> &str { "always panics" }
    fn input_schema(&self) -> Value { json!({"type": "object"}) }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, ToolCallError> {
        panic!("kaboom")
    }
}

#[tokio::test]
async fn panicking_tool_becomes_error_result() {
    let mut reg = ToolRegistry::new();
    reg.register(PanickingTool);

    let result = reg.execute(&call("explode", json!({}))).await;
    assert!(result.is_error);
    assert!(result.content.contains("kaboom"));
}

struct ChattyTool;

#[async_trait::async_trait]
impl Tool for ChattyTool {
    fn name(&self) -> &str { "chatty" }
    fn description(&self) -> &str { "returns a lot" }
    fn input_schema(&self) -> Value { json!({"type": "object"}) }

    async fn execute(&self, _args: Value) -> Result<ToolOutput, ToolCallError> {
        Ok(ToolOutput::text("x".repeat(120)))
    }
}

#[tokio::test]
async fn oversized_results_are_truncated() {
    let mut reg = ToolRegistry::new().with_max_result_chars(100);
    reg.register(ChattyTool);

    let result = reg.execute(&call("chatty", json!({}))).await;
    assert!(!result.is_error);
    assert!(result.content.starts_with(&"x".repeat(100)));
    assert!(result.content.contains("truncated 20 of 120"));
}

// ===========================================================================
// record_unknown_question / record_user_details
// ===========================================================================

#[tokio::test]
async fn unknown_question_notifies_once() {
    let notifier = Arc::new(RecordingNotifier::default());
    let reg = registry_with(notifier.clone());

    let result = reg
        .execute(&call("record_unknown_question", json!({"question": "What is your favourite colour?"})))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.content, "ok");
    assert_eq!(notifier.sent(), vec!["Recording What is your favourite colour?"]);
}

#[tokio::test]
async fn user_details_with_defaults() {
    let notifier = Arc::new(RecordingNotifier::default());
    let reg = registry_with(notifier.clone());

    let result = reg.execute(&call("record_user_details", json!({"email": "bob@example.com"}))).await;
    assert_eq!(result.content, "ok");
    assert_eq!(
        notifier.sent(),
        vec!["Recording Name not provided with email bob@example.com and notes not provided"]
    );
}

#[tokio::test]
async fn user_details_with_all_fields() {
    let notifier = Arc::new(RecordingNotifier::default());
    let reg = registry_with(notifier.clone());

    reg.execute(&call(
        "record_user_details",
        json!({"email": "bob@example.com", "name": "Bob", "notes": "hiring for a Rust role"}),
    ))
    .await;
    assert_eq!(
        notifier.sent(),
        vec!["Recording Bob with email bob@example.com and notes hiring for a Rust role"]
    );
}

#[tokio::test]
async fn notifier_failure_still_acknowledges() {
    let reg = registry_with(Arc::new(FailingNotifier));

    let result = reg.execute(&call("record_unknown_question", json!({"question": "q"}))).await;
    assert!(!result.is_error);
    assert_eq!(result.content, "ok");

    let result = reg.execute(&call("record_user_details", json!({"email": "a@b.c"}))).await;
    assert_eq!(result.content, "ok");
}

// ===========================================================================
// read_repo_file
// ===========================================================================

#[tokio::test]
async fn read_returns_exact_content() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "ada/engine", "path": "README.md"})))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.content, "# Engine\n\nA toy LSM tree.");
}

#[tokio::test]
async fn read_accepts_alternate_argument_names() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("read_repo_file", json!({"repo_name": "ada/engine", "file_path": "./README.md"})))
        .await;
    assert_eq!(result.content, "# Engine\n\nA toy LSM tree.");
}

#[tokio::test]
async fn read_unknown_repo_lists_available() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "bob/x", "path": "README.md"})))
        .await;
    assert!(result.is_error);
    assert_eq!(
        result.content,
        "Error: Repository 'bob/x' not found. Available repositories: ada/big, ada/engine"
    );
}

#[tokio::test]
async fn read_unknown_repo_with_empty_store() {
    let store = Arc::new(KnowledgeStore::new(Profile::new("Ada", "s", "d"), Vec::new()));
    let reg = create_career_registry(store, Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "ada/engine", "path": "README.md"})))
        .await;
    assert!(result.content.ends_with("Available repositories: none"));
}

#[tokio::test]
async fn read_missing_and_uncaptured_files() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));

    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "ada/engine", "path": "nope.md"})))
        .await;
    assert!(result.is_error);
    assert!(result.content.contains("File not found in ada/engine: nope.md"));

    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "ada/engine", "path": "src/main.rs"})))
        .await;
    assert!(result.is_error);
    assert!(result.content.contains("only README and development-log files are loaded"));

    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "ada/engine", "path": "../secrets"})))
        .await;
    assert!(result.is_error);
    assert!(result.content.contains("path traversal"));
}

// ===========================================================================
// list_repo_files
// ===========================================================================

#[tokio::test]
async fn list_with_pattern() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/engine", "dir": "", "pattern": "*.md"})))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.content, "README.md\ndocs/design.md");
}

#[tokio::test]
async fn list_defaults_to_whole_repository() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg.execute(&call("list_repo_files", json!({"repo": "ada/engine"}))).await;
    assert_eq!(result.content, "README.md\ndocs/design.md\nsrc/main.rs");
}

#[tokio::test]
async fn list_no_matches_is_not_an_error() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/engine", "pattern": "*.py"})))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.content, "No files found in ada/engine/.");
}

#[tokio::test]
async fn list_missing_directory_is_an_error() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/engine", "dir": "nowhere"})))
        .await;
    assert!(result.is_error);
    assert_eq!(result.content, "Error: Directory not found in ada/engine: nowhere");
}

#[tokio::test]
async fn list_plain_word_matches_names_containing_it() {
    let notes = RepositorySnapshot::new("ada/notes", BTreeMap::new())
        .with_tree(["README.md", "docs/dev_log.md", "CHANGELOG.md"].map(String::from));
    let store = Arc::new(KnowledgeStore::new(Profile::new("Ada", "s", "d"), vec![notes]));
    let reg = create_career_registry(store, Arc::new(RecordingNotifier::default()));

    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/notes", "pattern": "README"})))
        .await;
    assert_eq!(result.content, "README.md");

    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/notes", "pattern": "log"})))
        .await;
    assert_eq!(result.content, "CHANGELOG.md\ndocs/dev_log.md");
}

#[tokio::test]
async fn list_marks_capped_repository_tree() {
    let huge = RepositorySnapshot::new("ada/huge", BTreeMap::new())
        .with_tree(["assets/a.png", "src/main.rs"].map(String::from))
        .with_truncated(true);
    let store = Arc::new(KnowledgeStore::new(Profile::new("Ada", "s", "d"), vec![huge]));
    let reg = create_career_registry(store, Arc::new(RecordingNotifier::default()));

    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/huge", "dir": "src"})))
        .await;
    assert!(!result.is_error);
    assert_eq!(
        result.content,
        format!("src/main.rs\n... (repository has more than {} files; some are not listed)", MAX_TREE_ENTRIES)
    );

    let result = reg.execute(&call("list_repo_files", json!({"repo": "ada/engine"}))).await;
    assert!(!result.content.contains("some are not listed"));
}

#[tokio::test]
async fn repository_tools_reject_unknown_arguments() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));

    let result = reg
        .execute(&call("list_repo_files", json!({"repo": "ada/engine", "recursive": true})))
        .await;
    assert!(result.is_error);
    assert!(result.content.contains("Invalid arguments for list_repo_files"));
    assert!(result.content.contains("recursive"));

    let result = reg
        .execute(&call("read_repo_file", json!({"repo": "ada/engine", "path": "README.md", "lines": 10})))
        .await;
    assert!(result.is_error);
    assert!(result.content.contains("Invalid arguments for read_repo_file"));
}

#[tokio::test]
async fn list_unknown_repo() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg.execute(&call("list_repo_files", json!({"repo": "bob/x"}))).await;
    assert!(result.is_error);
    assert!(result.content.starts_with("Error: Repository 'bob/x' not found."));
}

#[tokio::test]
async fn list_output_is_capped() {
    let reg = registry_with(Arc::new(RecordingNotifier::default()));
    let result = reg.execute(&call("list_repo_files", json!({"repo": "ada/big", "dir": "src"}))).await;
    let lines: Vec<&str> = result.content.lines().collect();
    assert_eq!(lines.len(), MAX_LISTED_FILES + 1);
    assert_eq!(lines[0], "src/f000.rs");
    assert_eq!(lines[MAX_LISTED_FILES], "... (showing first 200 of 250 files)");
}

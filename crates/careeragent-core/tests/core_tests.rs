//! Tests for careeragent-core: messages, tool-call linkage, config loading, errors

use careeragent_core::*;
use serde_json::json;

// ===========================================================================
// Role
// ===========================================================================

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
    assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), r#""tool""#);
    let back: Role = serde_json::from_str(r#""assistant""#).unwrap();
    assert_eq!(back, Role::Assistant);
}

// ===========================================================================
// Message
// ===========================================================================

#[test]
fn message_constructors() {
    let m = Message::user("hi");
    assert_eq!(m.role, Role::User);
    assert!(m.is_plain_turn());

    let m = Message::tool_result("call-1", "read_repo_file", "contents");
    assert_eq!(m.role, Role::Tool);
    assert_eq!(m.tool_call_id.as_deref(), Some("call-1"));
    assert_eq!(m.name.as_deref(), Some("read_repo_file"));
    assert!(!m.is_plain_turn());
}

#[test]
fn assistant_with_tools_is_not_plain() {
    let m = Message::assistant_with_tools(
        "",
        vec![ToolCall::new("c1", "list_repo_files", json!({"repo": "me/a"}))],
    );
    assert!(m.has_tool_calls());
    assert!(!m.is_plain_turn());
}

#[test]
fn chat_history_deserializes_without_optional_fields() {
    let history: Vec<Message> = serde_json::from_value(json!([
        {"role": "user", "content": "hello"},
        {"role": "assistant", "content": "hi!"}
    ]))
    .unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(Message::is_plain_turn));
}

#[test]
fn plain_message_serialization_omits_tool_fields() {
    let json = serde_json::to_value(Message::assistant("done")).unwrap();
    assert!(json.get("tool_calls").is_none());
    assert!(json.get("tool_call_id").is_none());
}

// ===========================================================================
// ToolCall
// ===========================================================================

#[test]
fn tool_call_from_raw_json_object() {
    let tc = ToolCall::from_raw("c1", "read_repo_file", r#"{"repo":"me/a","path":"README.md"}"#);
    assert_eq!(tc.arguments["path"], "README.md");
}

#[test]
fn tool_call_from_empty_raw_is_empty_object() {
    let tc = ToolCall::from_raw("c1", "list_repo_files", "  ");
    assert_eq!(tc.arguments, json!({}));
}

#[test]
fn tool_call_from_malformed_raw_keeps_text() {
    let tc = ToolCall::from_raw("c1", "read_repo_file", r#"{"repo": "#);
    assert_eq!(tc.arguments, json!(r#"{"repo": "#));
}

// ===========================================================================
// check_tool_linkage
// ===========================================================================

fn call(id: &str) -> ToolCall {
    ToolCall::new(id, "record_unknown_question", json!({"question": "?"}))
}

#[test]
fn linkage_accepts_batched_results() {
    let messages = vec![
        Message::user("q"),
        Message::assistant_with_tools("", vec![call("a"), call("b")]),
        Message::tool_result("a", "record_unknown_question", "ok"),
        Message::tool_result("b", "record_unknown_question", "ok"),
        Message::assistant("answer"),
    ];
    assert!(check_tool_linkage(&messages).is_ok());
}

#[test]
fn linkage_rejects_unknown_id() {
    let messages = vec![
        Message::assistant_with_tools("", vec![call("a")]),
        Message::tool_result("zzz", "record_unknown_question", "ok"),
    ];
    match check_tool_linkage(&messages) {
        Err(Error::InvalidHistory { index, reason }) => {
            assert_eq!(index, 1);
            assert!(reason.contains("zzz"));
        }
        other => panic!("Expected InvalidHistory, got {:?}", other),
    }
}

#[test]
fn linkage_rejects_result_after_user_turn() {
    let messages = vec![
        Message::assistant_with_tools("", vec![call("a")]),
        Message::user("interrupt"),
        Message::tool_result("a", "record_unknown_question", "ok"),
    ];
    assert!(check_tool_linkage(&messages).is_err());
}

#[test]
fn linkage_rejects_result_without_id() {
    let mut orphan = Message::tool_result("a", "x", "ok");
    orphan.tool_call_id = None;
    let messages = vec![Message::assistant_with_tools("", vec![call("a")]), orphan];
    assert!(check_tool_linkage(&messages).is_err());
}

#[test]
fn linkage_empty_history_ok() {
    assert!(check_tool_linkage(&[]).is_ok());
}

// ===========================================================================
// AppConfig
// ===========================================================================

#[test]
fn config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.model(), "gpt-4o-mini");
    assert_eq!(config.agent.max_rounds, 10);
    assert_eq!(config.agent.model_timeout().as_secs(), 60);
    assert_eq!(config.gateway.port, 7860);
    assert_eq!(config.gateway.bind, BindMode::Loopback);
    assert!(config.github.repos.is_empty());
}

#[test]
fn config_partial_toml_fills_defaults() {
    let config = AppConfig::from_toml(
        r#"
        [llm]
        provider = "anthropic"

        [agent]
        max_rounds = 4

        [github]
        repos = ["me/alpha"]
        "#,
    )
    .unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Anthropic);
    assert_eq!(config.agent.max_rounds, 4);
    assert_eq!(config.agent.model_timeout_secs, 60);
    assert_eq!(config.github.repos, vec!["me/alpha"]);
    assert_eq!(config.profile.summary_file, "summary.txt");
}

#[test]
fn config_invalid_toml_is_error() {
    assert!(AppConfig::from_toml("[agent]\nmax_rounds = \"many\"").is_err());
}

#[test]
fn config_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.agent.max_rounds, 10);
}

#[test]
fn config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("careeragent.toml");
    std::fs::write(&path, "[gateway]\nport = 9000\nbind = \"lan\"\n").unwrap();
    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.gateway.port, 9000);
    assert_eq!(config.gateway.bind.to_addr(), "0.0.0.0");
}

#[test]
fn config_to_toml_skips_secrets() {
    let mut config = AppConfig::default();
    config.llm.api_key = Some("sk-secret".into());
    config.github.token = Some("ghp-secret".into());
    let rendered = config.to_toml();
    assert!(!rendered.contains("sk-secret"));
    assert!(!rendered.contains("ghp-secret"));
    assert!(rendered.contains("[agent]"));
}

#[test]
fn bind_mode_parse() {
    assert_eq!("localhost".parse::<BindMode>().unwrap(), BindMode::Loopback);
    assert_eq!("lan".parse::<BindMode>().unwrap(), BindMode::Lan);
    assert!("moon".parse::<BindMode>().is_err());
}

#[test]
fn parse_repo_list_handles_blanks() {
    assert_eq!(parse_repo_list("a/b,,c/d"), vec!["a/b", "c/d"]);
    assert!(parse_repo_list(" , ").is_empty());
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_display() {
    assert_eq!(Error::config("missing key").to_string(), "config error: missing key");
    assert_eq!(
        Error::invalid_history(3, "bad").to_string(),
        "invalid history at message 3: bad"
    );
}

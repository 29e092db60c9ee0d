//! Application configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment.
//! Every section falls back to defaults, so an empty file is a valid config.
//! Secrets are only read from the environment and never written back out.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub agent: AgentSettings,
    pub profile: ProfileConfig,
    pub github: GithubConfig,
    pub notifier: NotifierConfig,
    pub gateway: GatewayConfig,
}

/// Which hosted model API to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open-ai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            other => Err(Error::config(format!("unknown provider '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    /// Model id. Defaults per provider when unset.
    pub model: Option<String>,
    /// Override the provider endpoint (proxies, OpenAI-compatible hosts).
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: None,
            base_url: None,
            api_key: None,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

/// Conversation loop limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum model invocations per user turn.
    pub max_rounds: usize,
    /// Timeout for a single model call, in seconds.
    pub model_timeout_secs: u64,
    /// Tool results longer than this are truncated before reaching the model.
    pub max_tool_result_chars: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_rounds: 10,
            model_timeout_secs: 60,
            max_tool_result_chars: 50_000,
        }
    }
}

impl AgentSettings {
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model_timeout_secs)
    }
}

/// Where the personal profile lives on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub name: String,
    pub dir: PathBuf,
    pub summary_file: String,
    pub document_file: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: "Seung-Gu".into(),
            dir: PathBuf::from("me"),
            summary_file: "summary.txt".into(),
            document_file: "resume.md".into(),
        }
    }
}

impl ProfileConfig {
    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(&self.summary_file)
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(&self.document_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Explicit `owner/name` list. Empty means discover from the token.
    pub repos: Vec<String>,
    pub api_url: String,
    pub clone_timeout_secs: u64,
    pub max_concurrent_clones: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            repos: Vec::new(),
            api_url: "https://api.github.com".into(),
            clone_timeout_secs: 60,
            max_concurrent_clones: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    #[serde(skip_serializing)]
    pub pushover_token: Option<String>,
    #[serde(skip_serializing)]
    pub pushover_user: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            pushover_token: None,
            pushover_user: None,
            api_url: "https://api.pushover.net/1/messages.json".into(),
            timeout_secs: 10,
        }
    }
}

/// Gateway configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub port: u16,
    pub bind: BindMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 7860,
            bind: BindMode::default(),
        }
    }
}

/// Bind mode for the gateway
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindMode {
    #[default]
    Loopback,
    Lan,
}

impl BindMode {
    pub fn to_addr(&self) -> &str {
        match self {
            BindMode::Loopback => "127.0.0.1",
            BindMode::Lan => "0.0.0.0",
        }
    }
}

impl std::str::FromStr for BindMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "loopback" | "localhost" | "127.0.0.1" => Ok(BindMode::Loopback),
            "lan" | "0.0.0.0" => Ok(BindMode::Lan),
            other => Err(Error::config(format!("unknown bind mode '{}'", other))),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl AppConfig {
    /// Load config from a TOML file. A missing file yields defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml(&content)?;
                tracing::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Write the current config as TOML (secrets are skipped).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(provider) = var("CAREERAGENT_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Some(model) = var("CAREERAGENT_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = var("CAREERAGENT_API_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(key) = var(self.llm.provider.api_key_var()) {
            self.llm.api_key = Some(key);
        }
        if let Some(name) = var("CAREERAGENT_NAME") {
            self.profile.name = name;
        }

        if let Some(token) = var("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
        if let Some(repos) = var("GITHUB_REPOS") {
            self.github.repos = parse_repo_list(&repos);
        }

        if let Some(token) = var("PUSHOVER_TOKEN") {
            self.notifier.pushover_token = Some(token);
        }
        if let Some(user) = var("PUSHOVER_USER") {
            self.notifier.pushover_user = Some(user);
        }

        Ok(())
    }

    /// Fail fast on anything the process cannot serve without.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.is_none() {
            return Err(Error::config(format!(
                "{} not set",
                self.llm.provider.api_key_var()
            )));
        }
        if self.agent.max_rounds == 0 {
            return Err(Error::config("agent.max_rounds must be at least 1"));
        }
        if self.profile.name.trim().is_empty() {
            return Err(Error::config("profile.name must not be empty"));
        }
        Ok(())
    }
}

/// Split a comma-separated `owner/name` list, dropping blanks.
pub fn parse_repo_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

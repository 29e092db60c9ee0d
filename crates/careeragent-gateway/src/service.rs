//! Startup wiring: config, provider, knowledge, notifier, tools, agent

use anyhow::Context;
use careeragent_agent::{build_system_prompt, AgentConfig, CareerAgent};
use careeragent_core::{AppConfig, LlmConfig, ProviderKind};
use careeragent_knowledge::{load_store, KnowledgeStore};
use careeragent_llm::{AnthropicProvider, LlmProvider, OpenAiProvider};
use careeragent_notify::Notifier;
use careeragent_tools::create_career_registry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// The assembled agent plus what the surfaces show about it.
pub struct CareerService {
    pub agent: Arc<CareerAgent>,
    pub profile_name: String,
    pub repositories: Vec<String>,
}

/// Config file, then environment, then the profile directory override.
/// Fails when the process could not serve a single request.
pub fn load_config(path: &Path, profile_dir: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(path).with_context(|| format!("reading {}", path.display()))?;
    config.apply_env()?;
    if let Some(dir) = profile_dir {
        config.profile.dir = dir;
    }
    config.validate()?;
    Ok(config)
}

pub fn build_provider(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("{} not set", config.provider.api_key_var()))?;

    let provider: Arc<dyn LlmProvider> = match config.provider {
        ProviderKind::OpenAi => {
            let mut provider = OpenAiProvider::new(api_key);
            if let Some(url) = &config.base_url {
                info!("Using custom API URL: {}", url);
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        ProviderKind::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key);
            if let Some(url) = &config.base_url {
                let url = format!("{}/v1/messages", url.trim_end_matches('/'));
                info!("Using custom API URL: {}", url);
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
    };
    Ok(provider)
}

/// Wire an agent from already-loaded parts.
pub fn assemble_agent(
    provider: Arc<dyn LlmProvider>,
    knowledge: Arc<KnowledgeStore>,
    notifier: Arc<dyn Notifier>,
    config: &AppConfig,
) -> CareerService {
    let repositories: Vec<String> = knowledge.repository_ids().into_iter().map(String::from).collect();
    let profile_name = knowledge.profile().name.clone();
    let system_prompt = build_system_prompt(knowledge.profile(), &knowledge.repository_ids());

    let tools = create_career_registry(knowledge, notifier)
        .with_max_result_chars(config.agent.max_tool_result_chars);
    info!("Registered tools: {:?}", tools.list());

    let agent = CareerAgent::new(provider, tools, system_prompt, AgentConfig::from_app_config(config));
    CareerService {
        agent: Arc::new(agent),
        profile_name,
        repositories,
    }
}

/// Load everything the agent needs. Profile and LLM key problems are fatal;
/// repositories that cannot be fetched are skipped.
pub async fn build_agent(config: &AppConfig) -> anyhow::Result<CareerService> {
    let provider = build_provider(&config.llm)?;
    let knowledge = load_store(config).await.context("loading profile")?;
    info!(
        "Knowledge loaded: profile={}, repositories={}",
        knowledge.profile().name,
        knowledge.repository_ids().len()
    );
    let notifier = careeragent_notify::from_config(&config.notifier)?;
    info!("Notifier: {}", notifier.name());

    Ok(assemble_agent(provider, Arc::new(knowledge), notifier, config))
}

/// Ask a running gateway for its health document.
pub async fn check_health(port: u16) -> anyhow::Result<serde_json::Value> {
    let url = format!("http://127.0.0.1:{}/health", port);
    let resp = reqwest::get(&url).await?.error_for_status()?;
    let json: serde_json::Value = resp.json().await?;
    Ok(json)
}

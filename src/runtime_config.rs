use std::path::Path;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_MAX_STEPS;
use crate::agent_output_sanitize::SanitizeRules;
use crate::providers::ProviderKind;
use crate::transcript::Verbosity;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChefConfig {
    pub version: u32,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub sanitize: SanitizeRules,
}

impl Default for ChefConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            provider: ProviderSettings::default(),
            agent: AgentSettings::default(),
            sanitize: SanitizeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub http_timeout_ms: u64,
    pub http_connect_timeout_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Mock,
            base_url: "https://router.huggingface.co/v1".to_string(),
            model: "Qwen/Qwen2.5-Coder-32B-Instruct".to_string(),
            api_key_env: "HF_TOKEN".to_string(),
            max_tokens: 512,
            temperature: 0.2,
            http_timeout_ms: 120_000,
            http_connect_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_steps: usize,
    pub verbosity: Verbosity,
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            verbosity: Verbosity::Error,
            system_prompt: None,
        }
    }
}

impl ChefConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(anyhow!("unsupported config version {}", self.version));
        }
        if self.agent.max_steps == 0 {
            anyhow::bail!("agent.max_steps must be > 0");
        }
        if self.provider.model.trim().is_empty() {
            anyhow::bail!("provider.model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            anyhow::bail!("provider.temperature must be within 0.0..=2.0");
        }
        self.sanitize.validate()
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<ChefConfig> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: ChefConfig = serde_yaml::from_slice(&bytes)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}

/// Loads `path` when given, otherwise the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<ChefConfig> {
    match path {
        Some(p) => load_config(p),
        None => Ok(ChefConfig::default()),
    }
}

use tracing::{info, warn};

use crate::agent::Agent;
use crate::agent_output_sanitize::Sanitizer;
use crate::chat::ChefChat;
use crate::providers::mock::MockProvider;
use crate::providers::openai_compat::{OpenAiCompatConfig, OpenAiCompatProvider};
use crate::providers::{ModelProvider, ProviderKind};
use crate::runtime_config::{ChefConfig, ProviderSettings};

pub fn build_provider(settings: &ProviderSettings) -> anyhow::Result<Box<dyn ModelProvider>> {
    match settings.kind {
        ProviderKind::Mock => Ok(Box::new(MockProvider::new())),
        ProviderKind::OpenaiCompat => {
            let api_key = std::env::var(&settings.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty());
            if api_key.is_none() {
                warn!(
                    env = %settings.api_key_env,
                    "no API key found; sending requests without authorization"
                );
            }
            let provider = OpenAiCompatProvider::new(OpenAiCompatConfig {
                base_url: settings.base_url.clone(),
                api_key,
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
                http_timeout_ms: settings.http_timeout_ms,
                http_connect_timeout_ms: settings.http_connect_timeout_ms,
            })?;
            Ok(Box::new(provider))
        }
    }
}

pub fn build_agent(cfg: &ChefConfig) -> anyhow::Result<Agent<Box<dyn ModelProvider>>> {
    let provider = build_provider(&cfg.provider)?;
    let model = match cfg.provider.kind {
        ProviderKind::Mock => "mock".to_string(),
        ProviderKind::OpenaiCompat => cfg.provider.model.clone(),
    };
    let mut agent = Agent::new(provider, model);
    agent.max_steps = cfg.agent.max_steps;
    if let Some(prompt) = &cfg.agent.system_prompt {
        agent.system_prompt = prompt.clone();
    }
    info!(
        provider = cfg.provider.kind.as_str(),
        model = %agent.model,
        max_steps = agent.max_steps,
        "agent ready"
    );
    Ok(agent)
}

pub fn build_chat(cfg: &ChefConfig) -> anyhow::Result<ChefChat<Box<dyn ModelProvider>>> {
    let agent = build_agent(cfg)?;
    Ok(ChefChat::new(
        agent,
        Sanitizer::new(cfg.sanitize.clone()),
        cfg.agent.verbosity,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_kind_builds_offline_agent() {
        let mut cfg = ChefConfig::default();
        cfg.agent.max_steps = 5;
        cfg.agent.system_prompt = Some("breve".to_string());
        let agent = build_agent(&cfg).expect("agent");
        assert_eq!(agent.model, "mock");
        assert_eq!(agent.max_steps, 5);
        assert_eq!(agent.system_prompt, "breve");
        assert_eq!(agent.tools.len(), 2);
    }

    #[test]
    fn openai_compat_kind_uses_configured_model() {
        let mut cfg = ChefConfig::default();
        cfg.provider.kind = ProviderKind::OpenaiCompat;
        cfg.provider.api_key_env = "CHEFAGENT_TEST_UNSET_KEY".to_string();
        cfg.provider.model = "llama3".to_string();
        let chat = build_chat(&cfg).expect("chat");
        assert_eq!(chat.agent().model, "llama3");
        assert!(!chat.debug());
    }
}

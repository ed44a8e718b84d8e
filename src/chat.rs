//! Chat turn handling: run the agent, then either show everything (debug)
//! or only what survives the transcript sanitizer.

use tracing::warn;

use crate::agent::{Agent, AgentExitReason};
use crate::agent_output_sanitize::Sanitizer;
use crate::providers::ModelProvider;
use crate::transcript::{Transcript, Verbosity};
use crate::types::Role;

pub const DEBUG_HEADER: &str = "**🔧 MODO DEBUG COMPLETO:**";
pub const DEBUG_ERROR_HEADER: &str = "**🔧 ERROR DEBUG:**";
pub const FAILURE_MESSAGE: &str = "Disculpa, hubo un problema. ¿Puedes reformular tu pregunta?";

pub const EXAMPLE_PROMPTS: &[&str] = &[
    "¿Qué ingredientes tengo disponibles?",
    "¿Qué comida mexicana puedo preparar con lo que compré?",
    "Dame una receta fácil con aguacate",
    "¿Qué recetas colombianas puedo hacer?",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Message(String),
    Debug(Option<bool>),
    Reset,
    History,
    Exit,
    Empty,
}

impl ChatCommand {
    pub fn parse(input: &str) -> Self {
        let normalized = normalize_input(input);
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return ChatCommand::Empty;
        }
        let mut parts = trimmed.split_whitespace();
        match parts.next().unwrap_or_default() {
            "/exit" | "/quit" => ChatCommand::Exit,
            "/reset" => ChatCommand::Reset,
            "/history" => ChatCommand::History,
            "/debug" => match parts.next().map(str::to_ascii_lowercase).as_deref() {
                Some("on") => ChatCommand::Debug(Some(true)),
                Some("off") => ChatCommand::Debug(Some(false)),
                _ => ChatCommand::Debug(None),
            },
            _ => ChatCommand::Message(trimmed.to_string()),
        }
    }
}

pub fn normalize_input(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

pub struct ChefChat<P: ModelProvider> {
    agent: Agent<P>,
    sanitizer: Sanitizer,
    verbosity: Verbosity,
    debug: bool,
    history: Vec<(Role, String)>,
}

impl<P: ModelProvider> ChefChat<P> {
    pub fn new(agent: Agent<P>, sanitizer: Sanitizer, verbosity: Verbosity) -> Self {
        Self {
            agent,
            sanitizer,
            verbosity,
            debug: false,
            history: Vec::new(),
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn set_debug(&mut self, on: bool) {
        self.debug = on;
    }

    pub fn history(&self) -> &[(Role, String)] {
        &self.history
    }

    pub fn agent(&self) -> &Agent<P> {
        &self.agent
    }

    /// Clears both the visible history and the agent's memory.
    pub fn reset(&mut self) {
        self.agent.reset();
        self.history.clear();
    }

    pub async fn respond(&mut self, message: &str) -> String {
        let reply = self.reply(message.trim()).await;
        self.history.push((Role::User, message.to_string()));
        self.history.push((Role::Assistant, reply.clone()));
        reply
    }

    async fn reply(&mut self, message: &str) -> String {
        let mut transcript = Transcript::new(self.verbosity);
        let outcome = self.agent.run(message, &mut transcript).await;
        if outcome.exit_reason == AgentExitReason::ProviderError {
            let error = outcome.error.unwrap_or_default();
            warn!(run_id = %outcome.run_id, error = %error, "agent run failed");
            return if self.debug {
                format!("{DEBUG_ERROR_HEADER}\n{error}")
            } else {
                FAILURE_MESSAGE.to_string()
            };
        }
        if self.debug {
            return format!("{DEBUG_HEADER}\n\n{}", outcome.final_output);
        }
        let raw = transcript.assemble(&outcome.final_output);
        self.sanitizer.sanitize(Some(&raw))
    }
}

pub fn render_history(history: &[(Role, String)]) -> String {
    history
        .iter()
        .map(|(role, text)| format!("{}: {}", role.as_str().to_uppercase(), text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

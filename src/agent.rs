use std::time::Instant;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::agent_output_sanitize::strip_reasoning;
use crate::providers::ModelProvider;
use crate::tools::{builtin_tools, execute_tool};
use crate::transcript::Transcript;
use crate::types::{GenerateRequest, Message, Role, TokenUsage, ToolCall, ToolDef};

pub const DEFAULT_MAX_STEPS: usize = 3;

pub const SYSTEM_PROMPT: &str = r#"
Eres un Chef Agente IA especializado ÚNICAMENTE en los ingredientes del último pedido del usuario.

REGLAS IMPORTANTES:
1. Para CUALQUIER pregunta sobre ingredientes, comida, recetas o cocina, SIEMPRE usa las herramientas.
2. NO respondas con tu conocimiento general sobre cocina.
3. SOLO usa la información que te den las herramientas.

Herramientas disponibles:
- get_last_order(): Para obtener ingredientes disponibles del último pedido
- recipe_finder(cuisine, ingredients): Para buscar recetas específicas con esos ingredientes

EJEMPLOS de cuándo usar herramientas:
- "¿Qué ingredientes tengo?" → Usar get_last_order()
- "¿Qué puedo cocinar?" → Usar get_last_order() y luego recipe_finder()
- "Dame una receta" → Usar get_last_order() y luego recipe_finder()
- "¿Cómo hago tacos?" → Usar get_last_order() y luego recipe_finder()

Si la pregunta NO es sobre comida/cocina (ej: "¿Cómo estás?"), puedes responder normalmente.
Pero para TODO lo relacionado con comida: USA LAS HERRAMIENTAS.
"#;

const FINAL_ANSWER_PROMPT: &str = "Se alcanzó el número máximo de pasos. Responde ahora con tu respuesta final usando solo la información que obtuviste de las herramientas.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentExitReason {
    Ok,
    ProviderError,
    MaxSteps,
}

impl AgentExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentExitReason::Ok => "ok",
            AgentExitReason::ProviderError => "provider_error",
            AgentExitReason::MaxSteps => "max_steps",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub exit_reason: AgentExitReason,
    pub final_output: String,
    pub error: Option<String>,
    pub steps: usize,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

pub struct Agent<P: ModelProvider> {
    pub provider: P,
    pub model: String,
    pub tools: Vec<ToolDef>,
    pub max_steps: usize,
    pub system_prompt: String,
    memory: Vec<Message>,
}

struct RunState {
    run_id: String,
    started_at: String,
    steps: usize,
    tool_calls: Vec<ToolCall>,
    usage: TokenUsage,
}

impl RunState {
    fn finish(
        self,
        exit_reason: AgentExitReason,
        final_output: String,
        error: Option<String>,
    ) -> AgentOutcome {
        AgentOutcome {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: now_rfc3339(),
            exit_reason,
            final_output,
            error,
            steps: self.steps,
            tool_calls: self.tool_calls,
            usage: self.usage,
        }
    }
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            tools: builtin_tools(),
            max_steps: DEFAULT_MAX_STEPS,
            system_prompt: SYSTEM_PROMPT.to_string(),
            memory: Vec::new(),
        }
    }

    /// Conversation carried between runs until [`Agent::reset`].
    pub fn memory(&self) -> &[Message] {
        &self.memory
    }

    pub fn reset(&mut self) {
        self.memory.clear();
    }

    fn request(&self, with_tools: bool, extra: Option<Message>) -> GenerateRequest {
        let mut messages = Vec::with_capacity(self.memory.len() + 2);
        messages.push(Message::text(Role::System, self.system_prompt.clone()));
        messages.extend(self.memory.iter().cloned());
        messages.extend(extra);
        let tools = if with_tools {
            let mut sorted = self.tools.clone();
            sorted.sort_by(|a, b| a.name.cmp(&b.name));
            Some(sorted)
        } else {
            None
        };
        GenerateRequest {
            model: self.model.clone(),
            messages,
            tools,
        }
    }

    pub async fn run(&mut self, task: &str, transcript: &mut Transcript) -> AgentOutcome {
        let mut state = RunState {
            run_id: Uuid::new_v4().to_string(),
            started_at: now_rfc3339(),
            steps: 0,
            tool_calls: Vec::new(),
            usage: TokenUsage {
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            },
        };
        debug!(run_id = %state.run_id, model = %self.model, "agent run started");
        transcript.run_header(task, &self.model);
        self.memory.push(Message::text(Role::User, task));

        for step in 1..=self.max_steps {
            state.steps = step;
            transcript.step_banner(step);
            let step_started = Instant::now();

            let resp = match self.provider.generate(self.request(true, None)).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(run_id = %state.run_id, step, error = %e, "provider call failed");
                    transcript.generation_error(&e.to_string());
                    return state.finish(
                        AgentExitReason::ProviderError,
                        String::new(),
                        Some(e.to_string()),
                    );
                }
            };
            add_usage(&mut state.usage, resp.usage.as_ref());
            if let Some(content) = resp.assistant.content.as_deref() {
                transcript.model_output(content);
            }
            self.memory.push(resp.assistant.clone());

            if resp.tool_calls.is_empty() {
                let answer = strip_reasoning(resp.assistant.content.as_deref().unwrap_or_default());
                transcript.final_answer(&answer);
                transcript.step_footer(step, step_started.elapsed(), &state.usage);
                debug!(run_id = %state.run_id, step, "agent produced final answer");
                return state.finish(AgentExitReason::Ok, answer, None);
            }

            for tc in &resp.tool_calls {
                state.tool_calls.push(tc.clone());
                transcript.tool_call(tc);
                let out = execute_tool(tc);
                debug!(run_id = %state.run_id, step, tool = %tc.name, ok = out.ok, "tool executed");
                if out.ok {
                    transcript.tool_output(&out.display);
                } else {
                    transcript.tool_error(&tc.name, &out.display);
                }
                self.memory.push(out.message);
            }
            transcript.step_footer(step, step_started.elapsed(), &state.usage);
        }

        transcript.max_steps_reached();
        debug!(run_id = %state.run_id, max_steps = self.max_steps, "max steps reached; requesting final answer");
        let extra = Message::text(Role::User, FINAL_ANSWER_PROMPT);
        match self.provider.generate(self.request(false, Some(extra))).await {
            Ok(resp) => {
                add_usage(&mut state.usage, resp.usage.as_ref());
                let answer = strip_reasoning(resp.assistant.content.as_deref().unwrap_or_default());
                transcript.final_answer(&answer);
                self.memory.push(resp.assistant);
                state.finish(AgentExitReason::MaxSteps, answer, None)
            }
            Err(e) => {
                warn!(run_id = %state.run_id, error = %e, "final answer call failed");
                transcript.generation_error(&e.to_string());
                state.finish(
                    AgentExitReason::ProviderError,
                    String::new(),
                    Some(e.to_string()),
                )
            }
        }
    }
}

fn add_usage(total: &mut TokenUsage, step: Option<&TokenUsage>) {
    let Some(step) = step else {
        return;
    };
    if let Some(p) = step.prompt_tokens {
        total.prompt_tokens = Some(total.prompt_tokens.unwrap_or(0) + p);
    }
    if let Some(c) = step.completion_tokens {
        total.completion_tokens = Some(total.completion_tokens.unwrap_or(0) + c);
    }
}

pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;

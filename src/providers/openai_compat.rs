use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::providers::ModelProvider;
use crate::types::{
    GenerateRequest, GenerateResponse, Message, Role, TokenUsage, ToolCall, ToolDef,
};

#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub http_timeout_ms: u64,
    pub http_connect_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHttpError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for ProviderHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "provider returned HTTP {}: {}",
            self.status,
            self.body.chars().take(200).collect::<String>()
        )
    }
}

impl std::error::Error for ProviderHttpError {}

#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    cfg: OpenAiCompatConfig,
}

impl OpenAiCompatProvider {
    pub fn new(cfg: OpenAiCompatConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(cfg.http_connect_timeout_ms));
        if cfg.http_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(cfg.http_timeout_ms));
        }
        let client = builder.build().context("failed to build HTTP client")?;
        Ok(Self { client, cfg })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<CompletionToolCall>,
}

#[derive(Debug, Deserialize)]
struct CompletionToolCall {
    id: Option<String>,
    function: CompletionFunction,
}

#[derive(Debug, Deserialize)]
struct CompletionFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

pub fn build_request_body(req: &GenerateRequest, max_tokens: u32, temperature: f32) -> Value {
    let mut body = json!({
        "model": req.model,
        "messages": req.messages.iter().map(message_to_wire).collect::<Vec<_>>(),
        "max_tokens": max_tokens,
        "temperature": temperature,
        "stream": false,
    });
    if let Some(tools) = req.tools.as_ref().filter(|t| !t.is_empty()) {
        body["tools"] = Value::Array(tools.iter().map(tool_to_wire).collect());
    }
    body
}

fn message_to_wire(m: &Message) -> Value {
    let mut v = json!({
        "role": m.role.as_str(),
        "content": m.content.clone().unwrap_or_default(),
    });
    if let Some(calls) = m.tool_calls.as_ref().filter(|c| !c.is_empty()) {
        v["tool_calls"] = Value::Array(
            calls
                .iter()
                .map(|tc| {
                    json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {"name": tc.name, "arguments": tc.arguments.to_string()}
                    })
                })
                .collect(),
        );
    }
    if let Some(id) = &m.tool_call_id {
        v["tool_call_id"] = Value::String(id.clone());
    }
    v
}

fn tool_to_wire(t: &ToolDef) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": t.name,
            "description": t.description,
            "parameters": t.parameters,
        }
    })
}

pub fn parse_completion(raw: &str) -> anyhow::Result<GenerateResponse> {
    let resp: CompletionResponse =
        serde_json::from_str(raw).context("invalid chat completion response")?;
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("chat completion response has no choices"))?;

    let mut tool_calls = Vec::with_capacity(choice.message.tool_calls.len());
    for (idx, tc) in choice.message.tool_calls.into_iter().enumerate() {
        let arguments = match tc.function.arguments {
            Value::String(s) if s.trim().is_empty() => json!({}),
            Value::String(s) => serde_json::from_str(&s).with_context(|| {
                format!("tool call '{}' has invalid JSON arguments", tc.function.name)
            })?,
            Value::Null => json!({}),
            other => other,
        };
        tool_calls.push(ToolCall {
            id: tc.id.unwrap_or_else(|| format!("tc_{idx}")),
            name: tc.function.name,
            arguments,
        });
    }

    Ok(GenerateResponse {
        assistant: Message {
            role: Role::Assistant,
            content: choice.message.content,
            tool_call_id: None,
            tool_name: None,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls.clone())
            },
        },
        tool_calls,
        usage: resp.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }),
    })
}

#[async_trait]
impl ModelProvider for OpenAiCompatProvider {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let body = build_request_body(&req, self.cfg.max_tokens, self.cfg.temperature);
        let url = self.endpoint();
        debug!(%url, model = %req.model, messages = req.messages.len(), "sending chat completion");
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.cfg.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;
        if !status.is_success() {
            return Err(anyhow!(ProviderHttpError {
                status: status.as_u16(),
                body: text,
            }));
        }
        parse_completion(&text)
    }
}

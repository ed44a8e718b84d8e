//! Offline provider that plays the chef deterministically.
//!
//! It walks the same tool sequence a well-behaved model would: fetch the
//! last order, look up recipes for the requested cuisine, then answer with
//! what the tools returned.

use std::fmt;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::providers::ModelProvider;
use crate::recipes::NO_RECIPES_MESSAGE;
use crate::tools::{envelope_content, GET_LAST_ORDER, RECIPE_FINDER};
use crate::types::{GenerateRequest, GenerateResponse, Message, Role, TokenUsage, ToolCall};

pub const GREETING: &str = "¡Hola! Soy tu Chef Agente IA. Pregúntame qué recetas puedes preparar con los ingredientes de tu último pedido.";
const MARKER_PREFIX: &str = "__mock_tool_call__:";
const DEFAULT_CUISINE: &str = "mexicana";

const FOOD_HINTS: &[&str] = &[
    "ingrediente",
    "receta",
    "cocin",
    "comida",
    "comer",
    "prepar",
    "plato",
    "pedido",
    "taco",
    "guacamole",
    "quesadilla",
    "aguacate",
    "pollo",
    "queso",
    "cena",
    "almuerzo",
];

const RECIPE_HINTS: &[&str] = &["receta", "cocin", "comida", "prepar", "plato", "hacer", "hago"];

const CUISINE_STEMS: &[(&str, &str)] = &[
    ("mexic", "mexicana"),
    ("colombi", "colombiana"),
    ("argentin", "argentina"),
    ("españ", "española"),
    ("espan", "española"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockProviderError {
    InvalidJson { message: String },
    ExpectedJsonObject,
    EmptyToolName,
}

impl fmt::Display for MockProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { message } => {
                write!(f, "mock provider invalid tool-call JSON: {message}")
            }
            Self::ExpectedJsonObject => {
                write!(f, "mock provider tool-call payload must be a JSON object")
            }
            Self::EmptyToolName => {
                write!(f, "mock provider tool-call marker must include a tool name")
            }
        }
    }
}

impl std::error::Error for MockProviderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Chat,
    Ingredients,
    Recipes,
}

#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    fn build_response(&self, req: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let Some(user_idx) = req.messages.iter().rposition(|m| m.role == Role::User) else {
            return Ok(answer(req, GREETING.to_string()));
        };
        let user_text = req.messages[user_idx].content.as_deref().unwrap_or_default();
        let since_user = &req.messages[user_idx + 1..];
        let tools_offered = req.tools.as_ref().is_some_and(|t| !t.is_empty());
        let call_seq = req.messages.iter().filter(|m| m.role == Role::Tool).count();

        if let Some((name, args)) = parse_forced_call(user_text)? {
            if tools_offered && !since_user.iter().any(|m| m.role == Role::Tool) {
                return Ok(tool_call(call_seq, name, args));
            }
            let text = latest_tool_text(since_user).unwrap_or_else(|| GREETING.to_string());
            return Ok(answer(req, text));
        }

        let last_order = tool_result(since_user, GET_LAST_ORDER);
        let recipes = tool_result(since_user, RECIPE_FINDER);
        match classify(user_text) {
            Intent::Chat => Ok(answer(req, GREETING.to_string())),
            Intent::Ingredients => match last_order {
                Some(items) => Ok(answer(req, describe_order(&items))),
                None if tools_offered => Ok(tool_call(call_seq, GET_LAST_ORDER.to_string(), json!({}))),
                None => Ok(answer(req, GREETING.to_string())),
            },
            Intent::Recipes => {
                if let Some(found) = recipes {
                    return Ok(answer(req, describe_recipes(&found)));
                }
                match last_order {
                    Some(items) if tools_offered => Ok(tool_call(
                        call_seq,
                        RECIPE_FINDER.to_string(),
                        json!({"cuisine": detect_cuisine(user_text), "ingredients": items}),
                    )),
                    Some(items) => Ok(answer(req, describe_order(&items))),
                    None if tools_offered => {
                        Ok(tool_call(call_seq, GET_LAST_ORDER.to_string(), json!({})))
                    }
                    None => Ok(answer(req, GREETING.to_string())),
                }
            }
        }
    }
}

fn classify(user_text: &str) -> Intent {
    let lowered = user_text.to_lowercase();
    let is_food = FOOD_HINTS.iter().any(|h| lowered.contains(h))
        || CUISINE_STEMS.iter().any(|(stem, _)| lowered.contains(stem));
    if !is_food {
        return Intent::Chat;
    }
    let wants_recipes = RECIPE_HINTS.iter().any(|h| lowered.contains(h))
        || CUISINE_STEMS.iter().any(|(stem, _)| lowered.contains(stem));
    if lowered.contains("ingrediente") && !wants_recipes {
        Intent::Ingredients
    } else {
        Intent::Recipes
    }
}

fn detect_cuisine(user_text: &str) -> &'static str {
    let lowered = user_text.to_lowercase();
    CUISINE_STEMS
        .iter()
        .find(|(stem, _)| lowered.contains(stem))
        .map(|(_, key)| *key)
        .unwrap_or(DEFAULT_CUISINE)
}

fn parse_forced_call(content: &str) -> anyhow::Result<Option<(String, Value)>> {
    let Some((first_line, rest)) = content.split_once('\n') else {
        return Ok(None);
    };
    let Some(tool_name) = first_line.strip_prefix(MARKER_PREFIX) else {
        return Ok(None);
    };
    if tool_name.is_empty() {
        return Err(anyhow!(MockProviderError::EmptyToolName));
    }
    let args: Value = serde_json::from_str(rest).map_err(|e| {
        anyhow!(MockProviderError::InvalidJson {
            message: e.to_string()
        })
    })?;
    if !args.is_object() {
        return Err(anyhow!(MockProviderError::ExpectedJsonObject));
    }
    Ok(Some((tool_name.to_string(), args)))
}

fn tool_result(messages: &[Message], tool: &str) -> Option<Value> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == Role::Tool && m.tool_name.as_deref() == Some(tool))
        .find_map(envelope_content)
}

fn latest_tool_text(messages: &[Message]) -> Option<String> {
    let msg = messages.iter().rev().find(|m| m.role == Role::Tool)?;
    let content = envelope_content(msg)?;
    Some(match content {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn describe_order(items: &Value) -> String {
    let names = items
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();
    format!("Los ingredientes de tu último pedido son: {names}.")
}

fn describe_recipes(found: &Value) -> String {
    let text = found.as_str().unwrap_or_default().trim_end();
    if text.is_empty() || text == NO_RECIPES_MESSAGE {
        return NO_RECIPES_MESSAGE.to_string();
    }
    format!("Con los ingredientes de tu último pedido puedes preparar estas recetas:\n\n{text}")
}

fn estimate_tokens(text: &str) -> u32 {
    (text.chars().count() as u32).div_ceil(4)
}

fn prompt_usage(req: &GenerateRequest) -> u32 {
    req.messages
        .iter()
        .filter_map(|m| m.content.as_deref())
        .map(estimate_tokens)
        .sum()
}

fn answer(req: &GenerateRequest, text: String) -> GenerateResponse {
    let usage = TokenUsage {
        prompt_tokens: Some(prompt_usage(req)),
        completion_tokens: Some(estimate_tokens(&text)),
    };
    GenerateResponse {
        assistant: Message::text(Role::Assistant, text),
        tool_calls: Vec::new(),
        usage: Some(usage),
    }
}

fn tool_call(seq: usize, name: String, arguments: Value) -> GenerateResponse {
    let call = ToolCall {
        id: format!("mock_tc_{seq}"),
        name,
        arguments,
    };
    GenerateResponse {
        assistant: Message {
            role: Role::Assistant,
            content: None,
            tool_call_id: None,
            tool_name: None,
            tool_calls: Some(vec![call.clone()]),
        },
        tool_calls: vec![call],
        usage: None,
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.build_response(&req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_separates_chat_ingredients_and_recipes() {
        assert_eq!(classify("¿Cómo estás?"), Intent::Chat);
        assert_eq!(classify("¿Qué ingredientes tengo disponibles?"), Intent::Ingredients);
        assert_eq!(
            classify("¿Qué comida mexicana puedo preparar con lo que compré?"),
            Intent::Recipes
        );
        assert_eq!(classify("Dame una receta fácil con aguacate"), Intent::Recipes);
        assert_eq!(classify("¿Qué recetas colombianas puedo hacer?"), Intent::Recipes);
    }

    #[test]
    fn cuisine_detection_defaults_to_mexicana() {
        assert_eq!(detect_cuisine("¿Qué recetas colombianas puedo hacer?"), "colombiana");
        assert_eq!(detect_cuisine("algo de comida española"), "española");
        assert_eq!(detect_cuisine("Dame una receta fácil con aguacate"), "mexicana");
    }

    #[test]
    fn describe_recipes_passes_through_no_match_message() {
        assert_eq!(
            describe_recipes(&Value::String(NO_RECIPES_MESSAGE.to_string())),
            NO_RECIPES_MESSAGE
        );
    }
}

use serde::Serialize;
use serde_json::{json, Value};

use crate::recipes;
use crate::types::{Message, Role, ToolCall, ToolDef};

pub const GET_LAST_ORDER: &str = "get_last_order";
pub const RECIPE_FINDER: &str = "recipe_finder";
const RESULT_SCHEMA_VERSION: &str = "chefagent.tool_result.v1";

#[derive(Debug, Clone, Serialize)]
pub struct ToolResultEnvelope {
    pub schema_version: String,
    pub tool_name: String,
    pub tool_call_id: String,
    pub ok: bool,
    pub content: Value,
}

#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub ok: bool,
    /// Plain-text rendering of the result, as printed after `Out:`.
    pub display: String,
    pub message: Message,
}

pub fn builtin_tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            name: GET_LAST_ORDER.to_string(),
            description: "Esta herramienta obtiene la lista de ingredientes del último pedido de supermercado del usuario.".to_string(),
            parameters: json!({
                "type":"object",
                "properties":{},
                "required":[]
            }),
        },
        ToolDef {
            name: RECIPE_FINDER.to_string(),
            description: "Busca recetas basadas en una cocina específica y una lista de ingredientes disponibles.".to_string(),
            parameters: json!({
                "type":"object",
                "properties":{
                    "cuisine":{"type":"string","description":"Tipo de cocina, por ejemplo 'mexicana'"},
                    "ingredients":{
                        "type":"array",
                        "items":{"type":"string"},
                        "description":"Lista de ingredientes disponibles"
                    }
                },
                "required":["cuisine","ingredients"]
            }),
        },
    ]
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), String> {
    let obj = args
        .as_object()
        .ok_or_else(|| "arguments must be a JSON object".to_string())?;
    match tool_name {
        GET_LAST_ORDER => Ok(()),
        RECIPE_FINDER => {
            match obj.get("cuisine") {
                Some(v) if v.is_string() => {}
                Some(_) => return Err("cuisine must be a string".to_string()),
                None => return Err("missing required field: cuisine".to_string()),
            }
            let items = obj
                .get("ingredients")
                .ok_or_else(|| "missing required field: ingredients".to_string())?
                .as_array()
                .ok_or_else(|| "ingredients must be an array of strings".to_string())?;
            if items.iter().any(|x| x.as_str().is_none()) {
                return Err("ingredients must be an array of strings".to_string());
            }
            Ok(())
        }
        other => Err(format!("unknown tool: {other}")),
    }
}

pub fn execute_tool(tc: &ToolCall) -> ToolOutcome {
    if let Err(e) = validate_tool_args(&tc.name, &tc.arguments) {
        return outcome(tc, false, Value::String(e));
    }
    match tc.name.as_str() {
        GET_LAST_ORDER => outcome(tc, true, json!(recipes::last_order())),
        RECIPE_FINDER => {
            let cuisine = tc
                .arguments
                .get("cuisine")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let ingredients = string_array(tc.arguments.get("ingredients"));
            outcome(
                tc,
                true,
                Value::String(recipes::find_recipes(cuisine, &ingredients)),
            )
        }
        other => outcome(tc, false, Value::String(format!("unknown tool: {other}"))),
    }
}

fn string_array(v: Option<&Value>) -> Vec<String> {
    v.and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn outcome(tc: &ToolCall, ok: bool, content: Value) -> ToolOutcome {
    let display = match &content {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let env = ToolResultEnvelope {
        schema_version: RESULT_SCHEMA_VERSION.to_string(),
        tool_name: tc.name.clone(),
        tool_call_id: tc.id.clone(),
        ok,
        content,
    };
    ToolOutcome {
        ok,
        display,
        message: envelope_to_message(env),
    }
}

pub fn envelope_to_message(env: ToolResultEnvelope) -> Message {
    Message {
        role: Role::Tool,
        content: Some(serde_json::to_string(&env).unwrap_or_else(|e| {
            json!({"schema_version":RESULT_SCHEMA_VERSION,"ok":false,"content":format!("failed to serialize tool result envelope: {e}")}).to_string()
        })),
        tool_call_id: Some(env.tool_call_id.clone()),
        tool_name: Some(env.tool_name.clone()),
        tool_calls: None,
    }
}

/// Reads back the `content` of a tool message produced by [`execute_tool`].
pub fn envelope_content(msg: &Message) -> Option<Value> {
    let raw = msg.content.as_deref()?;
    let v: Value = serde_json::from_str(raw).ok()?;
    if v.get("ok").and_then(|ok| ok.as_bool()) != Some(true) {
        return None;
    }
    v.get("content").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "tc_0".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn builtin_tools_are_named_and_described() {
        let tools = builtin_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![GET_LAST_ORDER, RECIPE_FINDER]);
        assert!(tools.iter().all(|t| !t.description.is_empty()));
    }

    #[test]
    fn get_last_order_returns_ingredient_array() {
        let out = execute_tool(&call(GET_LAST_ORDER, json!({})));
        assert!(out.ok);
        assert_eq!(
            envelope_content(&out.message),
            Some(json!(recipes::last_order()))
        );
        assert!(out.display.starts_with("[\"tomates\",\"cebolla\""));
        assert_eq!(out.message.tool_call_id.as_deref(), Some("tc_0"));
    }

    #[test]
    fn recipe_finder_renders_matches() {
        let out = execute_tool(&call(
            RECIPE_FINDER,
            json!({"cuisine":"mexicana","ingredients":["aguacate","cebolla","tomates"]}),
        ));
        assert!(out.ok);
        assert!(out.display.starts_with("### Guacamole\n"));
        assert!(!out.display.contains("Tacos de Pollo"));
    }

    #[test]
    fn invalid_arguments_are_reported_not_executed() {
        let out = execute_tool(&call(RECIPE_FINDER, json!({"cuisine":"mexicana"})));
        assert!(!out.ok);
        assert_eq!(out.display, "missing required field: ingredients");
        assert_eq!(envelope_content(&out.message), None);

        let err = validate_tool_args(RECIPE_FINDER, &json!({"cuisine":1,"ingredients":[]}))
            .expect_err("bad cuisine type");
        assert_eq!(err, "cuisine must be a string");

        let err = validate_tool_args(
            RECIPE_FINDER,
            &json!({"cuisine":"mexicana","ingredients":["pollo", 3]}),
        )
        .expect_err("bad ingredient type");
        assert_eq!(err, "ingredients must be an array of strings");
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let out = execute_tool(&call("shell", json!({"cmd":"ls"})));
        assert!(!out.ok);
        assert_eq!(out.display, "unknown tool: shell");
        assert!(validate_tool_args(GET_LAST_ORDER, &json!([])).is_err());
    }
}

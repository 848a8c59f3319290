use serde_json::{json, Value};

use super::base::ProviderResponse;
use crate::errors::{TurnError, TurnResult};
use crate::models::message::Exchange;
use crate::models::tool::{Tool, ToolRequest, ToolResult};

/// Convert the turn's exchange to OpenAI's chat message specification
///
/// Ollama's OpenAI compatible endpoint accepts the same shape.
pub fn exchanges_to_openai_spec(exchanges: &[Exchange]) -> TurnResult<Vec<Value>> {
    let mut messages_spec = Vec::with_capacity(exchanges.len());

    for exchange in exchanges {
        let converted = match exchange {
            Exchange::Chat(message) => json!({
                "role": message.role,
                "content": message.content,
            }),
            Exchange::ToolRequest(request) => json!({
                "role": "assistant",
                "content": request.preamble,
                "tool_calls": [{
                    "id": request.id,
                    "type": "function",
                    "function": {
                        "name": request.name,
                        "arguments": request.arguments.to_string(),
                    }
                }]
            }),
            Exchange::ToolResponse { id, result } => json!({
                "role": "tool",
                "tool_call_id": id,
                "content": tool_result_payload(result)?,
            }),
        };
        messages_spec.push(converted);
    }

    Ok(messages_spec)
}

/// Convert the turn's exchange to Anthropic's messages specification
pub fn exchanges_to_anthropic_spec(exchanges: &[Exchange]) -> TurnResult<Vec<Value>> {
    let mut messages_spec = Vec::with_capacity(exchanges.len());

    for exchange in exchanges {
        let converted = match exchange {
            Exchange::Chat(message) => json!({
                "role": message.role,
                "content": message.content,
            }),
            Exchange::ToolRequest(request) => {
                let mut blocks = Vec::with_capacity(2);
                if let Some(text) = &request.preamble {
                    blocks.push(json!({"type": "text", "text": text}));
                }
                blocks.push(json!({
                    "type": "tool_use",
                    "id": request.id,
                    "name": request.name,
                    "input": request.arguments,
                }));
                json!({"role": "assistant", "content": blocks})
            }
            Exchange::ToolResponse { id, result } => json!({
                "role": "user",
                "content": [{
                    "type": "tool_result",
                    "tool_use_id": id,
                    "content": tool_result_payload(result)?,
                }]
            }),
        };
        messages_spec.push(converted);
    }

    Ok(messages_spec)
}

/// The JSON text the model sees as the result of a tool call
pub fn tool_result_payload(result: &ToolResult) -> TurnResult<String> {
    serde_json::to_string(result)
        .map_err(|e| TurnError::InvalidArguments(format!("Unserializable tool result: {}", e)))
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> TurnResult<Vec<Value>> {
    check_unique_names(tools)?;
    Ok(tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.name,
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect())
}

/// Convert internal Tool format to Anthropic's API tool specification
pub fn tools_to_anthropic_spec(tools: &[Tool]) -> TurnResult<Vec<Value>> {
    check_unique_names(tools)?;
    Ok(tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect())
}

fn check_unique_names(tools: &[Tool]) -> TurnResult<()> {
    let mut tool_names = std::collections::HashSet::new();
    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(TurnError::InvalidArguments(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }
    }
    Ok(())
}

/// Normalise an OpenAI chat completion into a provider response
pub fn openai_response_to_provider_response(response: &Value) -> TurnResult<ProviderResponse> {
    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| {
            TurnError::MalformedProviderOutput("Response has no choices[0].message".to_string())
        })?;

    let tool_calls = message
        .get("tool_calls")
        .and_then(|calls| calls.as_array())
        .filter(|calls| !calls.is_empty());

    if let Some(tool_calls) = tool_calls {
        if tool_calls.len() > 1 {
            tracing::warn!(
                count = tool_calls.len(),
                "provider requested several tool calls, only the first is run"
            );
        }
        let tool_call = &tool_calls[0];
        let id = required_str(tool_call, "id")?;
        let name = tool_call
            .get("function")
            .map(|function| required_str(function, "name"))
            .transpose()?
            .ok_or_else(|| {
                TurnError::MalformedProviderOutput("Tool call without a function".to_string())
            })?;
        let arguments = tool_call["function"]["arguments"].as_str().ok_or_else(|| {
            TurnError::MalformedProviderOutput(format!("Tool call {} has no arguments", id))
        })?;
        let arguments = serde_json::from_str::<Value>(arguments).map_err(|e| {
            TurnError::MalformedProviderOutput(format!(
                "Could not interpret tool use parameters for id {}: {}",
                id, e
            ))
        })?;

        let preamble = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Ok(ProviderResponse::ToolUse(
            ToolRequest::new(id, name, arguments).with_preamble(preamble),
        ));
    }

    match message.get("content").and_then(|content| content.as_str()) {
        Some(text) => Ok(ProviderResponse::Text(text.to_string())),
        None => Err(TurnError::MalformedProviderOutput(
            "Response carries neither text nor a tool call".to_string(),
        )),
    }
}

/// Normalise an Anthropic messages response into a provider response
pub fn anthropic_response_to_provider_response(response: &Value) -> TurnResult<ProviderResponse> {
    let blocks = response
        .get("content")
        .and_then(|content| content.as_array())
        .ok_or_else(|| {
            TurnError::MalformedProviderOutput("Response has no content blocks".to_string())
        })?;

    let mut tool_uses = blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| has_type(block, "tool_use"));

    if let Some((position, block)) = tool_uses.next() {
        if tool_uses.next().is_some() {
            tracing::warn!("provider requested several tool calls, only the first is run");
        }
        let id = required_str(block, "id")?;
        let name = required_str(block, "name")?;
        let input = block.get("input").cloned().ok_or_else(|| {
            TurnError::MalformedProviderOutput(format!("Tool use {} has no input", id))
        })?;
        let preamble = texts_of(&blocks[..position]).join("");
        return Ok(ProviderResponse::ToolUse(
            ToolRequest::new(id, name, input).with_preamble(preamble),
        ));
    }

    let texts = texts_of(blocks);
    if texts.is_empty() {
        return Err(TurnError::MalformedProviderOutput(
            "Response carries neither text nor a tool call".to_string(),
        ));
    }
    Ok(ProviderResponse::Text(texts.join("")))
}

fn has_type(block: &Value, kind: &str) -> bool {
    block.get("type").and_then(Value::as_str) == Some(kind)
}

fn texts_of(blocks: &[Value]) -> Vec<&str> {
    blocks
        .iter()
        .filter(|block| has_type(block, "text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect()
}

fn required_str(value: &Value, key: &str) -> TurnResult<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            TurnError::MalformedProviderOutput(format!("Missing string field '{}'", key))
        })
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

impl From<ContextLengthExceededError> for TurnError {
    fn from(err: ContextLengthExceededError) -> Self {
        TurnError::Provider(err.to_string())
    }
}

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

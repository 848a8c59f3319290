use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{token_count, Provider, ProviderResponse, Usage};
use super::configs::OpenAiProviderConfig;
use super::utils::{
    check_openai_context_length_error, exchanges_to_openai_spec,
    openai_response_to_provider_response, tools_to_openai_spec,
};
use crate::errors::{TurnError, TurnResult};
use crate::models::message::Exchange;
use crate::models::tool::Tool;

pub const OPENAI_HOST: &str = "https://api.openai.com";

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> TurnResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    async fn post(&self, payload: Value) -> TurnResult<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(TurnError::Provider(format!("Server error: {}", status)))
            }
            status => {
                let body: Value = response.json().await.unwrap_or(Value::Null);
                if let Some(err) = body
                    .get("error")
                    .and_then(check_openai_context_length_error)
                {
                    return Err(err.into());
                }
                Err(TurnError::Provider(format!(
                    "Request failed: {} - {}",
                    status, body
                )))
            }
        }
    }
}

/// Token usage as reported by OpenAI compatible endpoints
pub(crate) fn openai_usage(data: &Value) -> Usage {
    let Some(usage) = data.get("usage") else {
        return Usage::default();
    };

    let input_tokens = token_count(usage, "prompt_tokens");
    let output_tokens = token_count(usage, "completion_tokens");
    let total_tokens =
        token_count(usage, "total_tokens").or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input.saturating_add(output)),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}

/// Build a chat completions payload shared by OpenAI and Ollama
///
/// `json_response` switches on JSON mode, which only accepts a single JSON
/// object as the reply.
pub(crate) fn chat_completion_payload(
    model: &str,
    system: &str,
    exchanges: &[Exchange],
    tools: &[Tool],
    temperature: Option<f32>,
    max_tokens: Option<i32>,
    json_response: bool,
) -> TurnResult<Value> {
    let mut messages_array = vec![json!({
        "role": "system",
        "content": system
    })];
    messages_array.extend(exchanges_to_openai_spec(exchanges)?);

    let mut payload = json!({
        "model": model,
        "messages": messages_array
    });

    let tools_spec = tools_to_openai_spec(tools)?;
    if let Some(object) = payload.as_object_mut() {
        if !tools_spec.is_empty() {
            object.insert("tools".to_string(), json!(tools_spec));
        }
        if let Some(temp) = temperature {
            object.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = max_tokens {
            object.insert("max_tokens".to_string(), json!(tokens));
        }
        if json_response {
            object.insert(
                "response_format".to_string(),
                json!({"type": "json_object"}),
            );
        }
    }

    Ok(payload)
}

impl OpenAiProvider {
    async fn chat(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        tools: &[Tool],
        json_response: bool,
    ) -> TurnResult<(ProviderResponse, Usage)> {
        let payload = chat_completion_payload(
            model,
            system,
            exchanges,
            tools,
            self.config.temperature,
            self.config.max_tokens,
            json_response,
        )?;

        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(TurnError::Provider(format!("OpenAI API error: {}", error)));
        }

        let message = openai_response_to_provider_response(&response)?;
        Ok((message, openai_usage(&response)))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        tools: &[Tool],
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.chat(model, system, exchanges, tools, false).await
    }

    async fn complete_json(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.chat(model, system, exchanges, &[], true).await
    }
}

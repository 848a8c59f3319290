use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{token_count, Provider, ProviderResponse, Usage};
use super::configs::AnthropicProviderConfig;
use super::utils::{
    anthropic_response_to_provider_response, exchanges_to_anthropic_spec, tools_to_anthropic_spec,
};
use crate::errors::{TurnError, TurnResult};
use crate::models::message::Exchange;
use crate::models::tool::Tool;

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: i32 = 1024;

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> TurnResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = data.get("usage");
        let input_tokens = usage.and_then(|u| token_count(u, "input_tokens"));
        let output_tokens = usage.and_then(|u| token_count(u, "output_tokens"));
        let total_tokens = match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input.saturating_add(output)),
            _ => None,
        };

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> TurnResult<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(TurnError::Provider(format!("Server error: {}", status)))
            }
            status => {
                let error_text = response.text().await?;
                Err(TurnError::Provider(format!(
                    "Request failed: {} - {}",
                    status, error_text
                )))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        tools: &[Tool],
    ) -> TurnResult<(ProviderResponse, Usage)> {
        let mut payload = json!({
            "model": model,
            "system": system,
            "messages": exchanges_to_anthropic_spec(exchanges)?,
            "max_tokens": self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        let tools_spec = tools_to_anthropic_spec(tools)?;
        if let Some(object) = payload.as_object_mut() {
            if !tools_spec.is_empty() {
                object.insert("tools".to_string(), json!(tools_spec));
            }
            if let Some(temp) = self.config.temperature {
                object.insert("temperature".to_string(), json!(temp));
            }
        }

        let response = self.post(payload).await?;

        let message = anthropic_response_to_provider_response(&response)?;
        Ok((message, Self::get_usage(&response)))
    }
}

use super::base::{Provider, ProviderResponse, Usage};
use super::configs::OllamaProviderConfig;
use super::openai::{chat_completion_payload, openai_usage};
use super::utils::openai_response_to_provider_response;
use crate::errors::{TurnError, TurnResult};
use crate::models::message::Exchange;
use crate::models::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

pub const OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_MODEL: &str = "qwen2.5";

pub struct OllamaProvider {
    client: Client,
    config: OllamaProviderConfig,
}

impl OllamaProvider {
    pub fn new(config: OllamaProviderConfig) -> TurnResult<Self> {
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

        let response = self.client.post(&url).json(&payload).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(TurnError::Provider(format!("Server error: {}", status)))
            }
            status => Err(TurnError::Provider(format!(
                "Request failed: {}\nPayload: {}",
                status, payload
            ))),
        }
    }
}

impl OllamaProvider {
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

        let message = openai_response_to_provider_response(&response)?;
        Ok((message, openai_usage(&response)))
    }
}

#[async_trait]
impl Provider for OllamaProvider {
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

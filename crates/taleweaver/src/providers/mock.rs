use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::{TurnError, TurnResult};
use crate::models::message::Exchange;
use crate::models::tool::Tool;
use crate::providers::base::{Provider, ProviderResponse, Usage};

/// A mock provider that returns pre-configured responses for testing
///
/// Every call records the system prompt, model and exchange it was given.
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<TurnResult<ProviderResponse>>>>,
    repeat: Option<ProviderResponse>,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub system: String,
    pub exchanges: Vec<Exchange>,
    pub tools: Vec<Tool>,
    /// Whether the call asked for a JSON object reply
    pub json_response: bool,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<TurnResult<ProviderResponse>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Default::default()
        }
    }

    /// A provider that answers every round with the same response
    pub fn repeating(response: ProviderResponse) -> Self {
        Self {
            repeat: Some(response),
            ..Default::default()
        }
    }

    /// Sleep before answering, to exercise timeouts and cancellation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl MockProvider {
    async fn respond(&self, call: RecordedCall) -> TurnResult<(ProviderResponse, Usage)> {
        self.calls.lock().unwrap().push(call);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(response) = &self.repeat {
            return Ok((response.clone(), Usage::default()));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(TurnError::Provider(
                "mock provider has no scripted responses left".to_string(),
            ))
        } else {
            responses.remove(0).map(|response| (response, Usage::default()))
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        tools: &[Tool],
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.respond(RecordedCall {
            model: model.to_string(),
            system: system.to_string(),
            exchanges: exchanges.to_vec(),
            tools: tools.to_vec(),
            json_response: false,
        })
        .await
    }

    async fn complete_json(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.respond(RecordedCall {
            model: model.to_string(),
            system: system.to_string(),
            exchanges: exchanges.to_vec(),
            tools: Vec::new(),
            json_response: true,
        })
        .await
    }
}

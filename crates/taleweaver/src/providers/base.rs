use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::TurnResult;
use crate::models::message::Exchange;
use crate::models::tool::{Tool, ToolRequest};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Accumulate another round's usage, treating unknown counts as zero
    pub fn add(&mut self, other: &Usage) {
        fn sum(a: Option<i32>, b: Option<i32>) -> Option<i32> {
            match (a, b) {
                (None, None) => None,
                (a, b) => Some(a.unwrap_or(0).saturating_add(b.unwrap_or(0))),
            }
        }
        self.input_tokens = sum(self.input_tokens, other.input_tokens);
        self.output_tokens = sum(self.output_tokens, other.output_tokens);
        self.total_tokens = sum(self.total_tokens, other.total_tokens);
    }
}

/// What a backend produced for one round: either the final text or a request
/// to run a tool before answering.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    Text(String),
    ToolUse(ToolRequest),
}

/// Base trait for model backends (OpenAI, Anthropic, etc)
///
/// Implementations convert the exchange into their own wire format and
/// normalise whatever comes back into a [`ProviderResponse`]. A backend that
/// cannot express tool use simply never returns [`ProviderResponse::ToolUse`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Run one round against `model`
    async fn complete(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        tools: &[Tool],
    ) -> TurnResult<(ProviderResponse, Usage)>;

    /// Run one tool-free round whose reply must be a single JSON object
    ///
    /// Backends without a JSON mode answer through [`Provider::complete`] and
    /// rely on the instructions alone.
    async fn complete_json(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.complete(model, system, exchanges, &[]).await
    }
}

/// Read a token count from `data[key]`, dropping values that do not fit an `i32`
pub(crate) fn token_count(data: &serde_json::Value, key: &str) -> Option<i32> {
    data.get(key)
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
}

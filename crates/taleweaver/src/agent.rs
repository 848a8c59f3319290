use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{TurnError, TurnResult};
use crate::models::message::{Exchange, Message};
use crate::models::tool::{Tool, ToolRequest, ToolResult};
use crate::outcome::{self, random_outcome_tool, RandomOutcomeArgs, RANDOM_OUTCOME};
use crate::providers::base::{Provider, ProviderResponse, Usage};

pub const DEFAULT_MAX_ROUNDS: usize = 8;
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(120);

/// Limits applied to every reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Provider calls allowed per reply, the final text round included
    pub max_rounds: usize,
    pub round_timeout: Duration,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_timeout: DEFAULT_ROUND_TIMEOUT,
        }
    }
}

/// The final text of a reply and what it took to get there
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// Provider calls made, including the one that produced the text
    pub rounds: usize,
    /// Every draw made during the reply, in order
    pub draws: Vec<ToolResult>,
    pub usage: Usage,
}

/// Agent drives a provider until it answers in plain text, running the
/// `random_outcome` tool whenever the provider asks for it
pub struct Agent {
    provider: Arc<dyn Provider>,
    settings: LoopSettings,
    tools: Vec<Tool>,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, settings: LoopSettings) -> Self {
        Self {
            provider,
            settings,
            tools: vec![random_outcome_tool()],
        }
    }

    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Run the tool loop for one turn.
    ///
    /// `messages` is the transcript with the pending user message last. Tool
    /// requests and their results are kept in a local exchange that is
    /// discarded when this returns.
    pub async fn reply(
        &self,
        model: &str,
        system: &str,
        messages: &[Message],
        cancel: &CancellationToken,
    ) -> TurnResult<Reply> {
        let max_rounds = self.settings.max_rounds.max(1);
        let mut exchanges: Vec<Exchange> = messages.iter().cloned().map(Exchange::from).collect();
        let mut draws = Vec::new();
        let mut usage = Usage::default();

        for round in 1..=max_rounds {
            debug!(round, model, "requesting provider round");
            let (response, round_usage) = self
                .complete_round(model, system, &exchanges, &self.tools, cancel)
                .await?;
            usage.add(&round_usage);

            match response {
                ProviderResponse::Text(text) => {
                    info!(rounds = round, draws = draws.len(), "reply complete");
                    return Ok(Reply {
                        text,
                        rounds: round,
                        draws,
                        usage,
                    });
                }
                // The provider would never see a draw made now
                ProviderResponse::ToolUse(_) if round == max_rounds => break,
                ProviderResponse::ToolUse(request) => {
                    let result = self.dispatch_tool_call(&request)?;
                    let id = request.id.clone();
                    draws.push(result.clone());
                    exchanges.push(Exchange::ToolRequest(request));
                    exchanges.push(Exchange::ToolResponse { id, result });
                }
            }
        }

        warn!(max_rounds, "provider kept requesting tools");
        Err(TurnError::ToolLoopExceeded(max_rounds))
    }

    /// One provider call, bounded by the round timeout and the cancellation token
    pub(crate) async fn complete_round(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        tools: &[Tool],
        cancel: &CancellationToken,
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.bounded(self.provider.complete(model, system, exchanges, tools), cancel)
            .await
    }

    /// A tool-free call that asks the provider for a JSON object, with the same bounds
    pub(crate) async fn complete_json_round(
        &self,
        model: &str,
        system: &str,
        exchanges: &[Exchange],
        cancel: &CancellationToken,
    ) -> TurnResult<(ProviderResponse, Usage)> {
        self.bounded(self.provider.complete_json(model, system, exchanges), cancel)
            .await
    }

    async fn bounded<F>(
        &self,
        round: F,
        cancel: &CancellationToken,
    ) -> TurnResult<(ProviderResponse, Usage)>
    where
        F: Future<Output = TurnResult<(ProviderResponse, Usage)>>,
    {
        let round_timeout = self.settings.round_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TurnError::Cancelled),
            result = tokio::time::timeout(round_timeout, round) => match result {
                Ok(response) => response,
                Err(_) => Err(TurnError::Timeout(round_timeout)),
            },
        }
    }

    fn dispatch_tool_call(&self, request: &ToolRequest) -> TurnResult<ToolResult> {
        if request.name != RANDOM_OUTCOME {
            return Err(TurnError::UnknownTool(request.name.clone()));
        }

        let args = RandomOutcomeArgs::from_request(request)?;
        info!(
            outcomes = ?args.outcomes,
            description = %args.description,
            "random outcome requested"
        );
        let result = outcome::resolve(&args.outcomes, &args.description)?;
        info!(
            outcome = %result.outcome,
            index = result.index,
            total = result.total_outcomes,
            "random outcome drawn"
        );
        Ok(result)
    }
}

//! Guided questions that help an author turn an idea into a scenario file.
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::errors::{TurnError, TurnResult};
use crate::models::message::{Exchange, Message};
use crate::models::selector::ModelSelector;
use crate::providers::base::ProviderResponse;

pub const INTERVIEW_PROMPT: &str = include_str!("prompts/interview.md");
pub const INTERVIEW_MODEL: ModelSelector = ModelSelector::Gpt4o;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterviewStep {
    Question {
        question: String,
        sample_answer: Option<String>,
    },
    Complete,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStep {
    question: Option<String>,
    sample_answer: Option<String>,
    #[serde(default)]
    complete: bool,
}

/// Ask the provider for the next interview question
pub async fn next_step(
    agent: &Agent,
    model: &str,
    conversation: &[Message],
    cancel: &CancellationToken,
) -> TurnResult<InterviewStep> {
    if conversation.is_empty() {
        return Err(TurnError::InvalidArguments(
            "Conversation history is required".to_string(),
        ));
    }

    let exchanges: Vec<Exchange> = conversation.iter().cloned().map(Exchange::from).collect();
    let (response, _) = agent
        .complete_json_round(model, INTERVIEW_PROMPT, &exchanges, cancel)
        .await?;

    match response {
        ProviderResponse::Text(text) => parse_step(&text),
        ProviderResponse::ToolUse(request) => Err(TurnError::MalformedProviderOutput(format!(
            "interview expected JSON text, provider requested tool '{}'",
            request.name
        ))),
    }
}

/// Read the provider's JSON answer, tolerating a markdown code fence
pub fn parse_step(text: &str) -> TurnResult<InterviewStep> {
    let body = strip_code_fence(text.trim());
    let raw: RawStep = serde_json::from_str(body).map_err(|e| {
        TurnError::MalformedProviderOutput(format!("interview reply is not valid JSON: {}", e))
    })?;

    match raw.question {
        Some(question) if !raw.complete && !question.trim().is_empty() => {
            Ok(InterviewStep::Question {
                question,
                sample_answer: raw.sample_answer,
            })
        }
        _ => Ok(InterviewStep::Complete),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches("json");
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

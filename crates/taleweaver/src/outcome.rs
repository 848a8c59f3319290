//! The single side effect a model may request: drawing one label from a list.
//!
//! Weighting is expressed by the caller repeating labels, so a check that
//! succeeds one time in four is `["success", "fail", "fail", "fail"]`.
use rand::Rng;
use serde::Deserialize;
use serde_json::json;

use crate::errors::{TurnError, TurnResult};
use crate::models::tool::{Tool, ToolRequest, ToolResult};

pub const RANDOM_OUTCOME: &str = "random_outcome";

/// The schema offered to every provider on every round
pub fn random_outcome_tool() -> Tool {
    Tool::new(
        RANDOM_OUTCOME,
        "Pick one outcome at random from a list of possibilities. Use it whenever the player \
         does something with an uncertain result (flipping a coin, rolling dice, drawing a card) \
         or when the scenario assigns a probability to an action.",
        json!({
            "type": "object",
            "properties": {
                "outcomes": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Possible outcomes. A coin is [\"heads\", \"tails\"], a d6 is \
                        [\"1\", \"2\", \"3\", \"4\", \"5\", \"6\"]. Repeat an outcome to make it \
                        more likely, e.g. [\"success\", \"fail\", \"fail\", \"fail\"] \
                        for 25% success."
                },
                "description": {
                    "type": "string",
                    "description":
                        "What the draw is for, e.g. \"coin flip\" or \"picking the lock\""
                }
            },
            "required": ["outcomes", "description"]
        }),
    )
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RandomOutcomeArgs {
    pub outcomes: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl RandomOutcomeArgs {
    /// Read the arguments of a `random_outcome` request
    pub fn from_request(request: &ToolRequest) -> TurnResult<Self> {
        serde_json::from_value(request.arguments.clone()).map_err(|e| {
            TurnError::InvalidArguments(format!(
                "{} arguments for call {} are malformed: {}",
                RANDOM_OUTCOME, request.id, e
            ))
        })
    }
}

/// Draw one outcome uniformly at random
pub fn resolve(outcomes: &[String], description: &str) -> TurnResult<ToolResult> {
    resolve_with_rng(outcomes, description, &mut rand::thread_rng())
}

pub fn resolve_with_rng<R: Rng + ?Sized>(
    outcomes: &[String],
    description: &str,
    rng: &mut R,
) -> TurnResult<ToolResult> {
    if outcomes.is_empty() {
        return Err(TurnError::InvalidArguments(format!(
            "{} needs at least one outcome",
            RANDOM_OUTCOME
        )));
    }

    let index = rng.gen_range(0..outcomes.len());
    Ok(ToolResult {
        outcome: outcomes[index].clone(),
        index,
        total_outcomes: outcomes.len(),
        description: description.to_string(),
    })
}

use std::time::Duration;

use thiserror::Error;

/// Every way a single game turn can fail
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Content not found: {0}")]
    ContentNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Malformed provider output: {0}")]
    MalformedProviderOutput(String),

    #[error("Tool loop exceeded {0} rounds without a text reply")]
    ToolLoopExceeded(usize),

    #[error("Provider round timed out after {0:?}")]
    Timeout(Duration),

    #[error("Turn cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for TurnError {
    fn from(err: reqwest::Error) -> Self {
        TurnError::Provider(err.to_string())
    }
}

pub type TurnResult<T> = Result<T, TurnError>;

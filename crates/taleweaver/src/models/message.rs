use serde::{Deserialize, Serialize};

use super::tool::{ToolRequest, ToolResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single transcript entry. Never edited once it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One entry of the provider-facing sequence used within a single turn.
///
/// Tool requests and responses only ever live here; they are dropped when the
/// turn completes and never reach the caller's transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    Chat(Message),
    ToolRequest(ToolRequest),
    ToolResponse { id: String, result: ToolResult },
}

impl From<Message> for Exchange {
    fn from(message: Message) -> Self {
        Exchange::Chat(message)
    }
}

impl Exchange {
    pub fn as_tool_response(&self) -> Option<&ToolResult> {
        match self {
            Exchange::ToolResponse { result, .. } => Some(result),
            _ => None,
        }
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool that can be offered to a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// JSON schema of the arguments the tool accepts
    pub input_schema: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// A request from the model to run a tool.
///
/// `arguments` is the JSON object the backend produced. It is only checked
/// against a tool's schema once the tool has been identified by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    /// Backend-assigned call id, echoed back on the matching response
    pub id: String,
    pub name: String,
    pub arguments: Value,
    /// Text the model wrote in the same reply, ahead of the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
}

impl ToolRequest {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
            preamble: None,
        }
    }

    /// Attach the reply's leading text; blank text is dropped
    pub fn with_preamble<S: Into<String>>(mut self, text: S) -> Self {
        let text = text.into();
        self.preamble = (!text.trim().is_empty()).then_some(text);
        self
    }
}

/// The outcome of a random draw, fed back to the model verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub outcome: String,
    pub index: usize,
    pub total_outcomes: usize,
    pub description: String,
}

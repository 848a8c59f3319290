use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use taleweaver::content::ScenarioSummary;
use taleweaver::interview::InterviewStep;
use taleweaver::models::message::Message;

const LIST_FAILED: &str = "Failed to load scenarios";
const QUESTION_FAILED: &str = "Failed to generate question";

#[derive(Debug, Serialize)]
struct ListScenariosResponse {
    scenarios: Vec<ScenarioSummary>,
}

#[derive(Debug, Deserialize)]
struct QuestionRequest {
    #[serde(default)]
    conversation: Vec<Message>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionResponse {
    question: Option<String>,
    sample_answer: Option<String>,
    is_complete: bool,
}

impl From<InterviewStep> for QuestionResponse {
    fn from(step: InterviewStep) -> Self {
        match step {
            InterviewStep::Question {
                question,
                sample_answer,
            } => Self {
                question: Some(question),
                sample_answer,
                is_complete: false,
            },
            InterviewStep::Complete => Self {
                question: None,
                sample_answer: None,
                is_complete: true,
            },
        }
    }
}

async fn list_handler(
    State(state): State<AppState>,
) -> Result<Json<ListScenariosResponse>, ApiError> {
    let scenarios = state
        .narrator
        .content()
        .list_scenarios()
        .map_err(|e| ApiError::from_turn(e, LIST_FAILED))?;
    Ok(Json(ListScenariosResponse { scenarios }))
}

async fn question_handler(
    State(state): State<AppState>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    if request.conversation.is_empty() {
        return Err(ApiError::bad_request("Conversation history is required"));
    }

    let cancel = state.shutdown.child_token();
    let step = state
        .narrator
        .interview(&request.conversation, &cancel)
        .await
        .map_err(|e| ApiError::from_turn(e, QUESTION_FAILED))?;

    Ok(Json(step.into()))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/scenarios", get(list_handler))
        .route("/api/scenarios/question", post(question_handler))
        .with_state(state)
}

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use taleweaver::models::message::Message;
use taleweaver::narrator::{split_pending_action, TurnRequest};

const TURN_FAILED: &str = "Failed to process request";
const OPENING_FAILED: &str = "Failed to load opening";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameRequest {
    messages: Vec<Message>,
    #[serde(default)]
    scenario_id: Option<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct GameResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningQuery {
    #[serde(default)]
    scenario_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpeningResponse {
    opening: String,
}

// Empty ids from form fields mean "use the default"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn turn_handler(
    State(state): State<AppState>,
    payload: Result<Json<GameRequest>, JsonRejection>,
) -> Result<Json<GameResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (mut conversation, action) =
        split_pending_action(request.messages).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let turn = TurnRequest {
        action,
        scenario_id: non_empty(request.scenario_id),
        tone: non_empty(request.tone),
        model: non_empty(request.model),
    };

    let cancel = state.shutdown.child_token();
    let message = state
        .narrator
        .play_turn(&mut conversation, turn, &cancel)
        .await
        .map_err(|e| ApiError::from_turn(e, TURN_FAILED))?;

    Ok(Json(GameResponse { message }))
}

async fn opening_handler(
    State(state): State<AppState>,
    Query(query): Query<OpeningQuery>,
) -> Result<Json<OpeningResponse>, ApiError> {
    let scenario_id = non_empty(query.scenario_id);
    let opening = state
        .narrator
        .content()
        .opening(scenario_id.as_deref())
        .map_err(|e| ApiError::from_turn(e, OPENING_FAILED))?;

    Ok(Json(OpeningResponse { opening }))
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/game", post(turn_handler))
        .route("/api/game/opening", get(opening_handler))
        .with_state(state)
}

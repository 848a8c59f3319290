// Export route modules
pub mod game;
pub mod scenarios;

use crate::state::AppState;
use axum::Router;

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(game::routes(state.clone()))
        .merge(scenarios::routes(state))
}

use std::sync::Arc;
use taleweaver::narrator::Narrator;
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub narrator: Arc<Narrator>,
    /// Cancelled on shutdown; each request works under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(narrator: Narrator, shutdown: CancellationToken) -> Self {
        Self {
            narrator: Arc::new(narrator),
            shutdown,
        }
    }
}

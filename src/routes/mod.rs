use std::sync::Arc;

use axum::Router;

use crate::labels::Labels;
use crate::sources::SourceClient;

mod health;
mod reports;

// ---

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub sources: SourceClient,
    pub labels: Arc<dyn Labels>,
    pub brand: Arc<str>,
}

impl AppState {
    pub fn new(sources: SourceClient, labels: Arc<dyn Labels>, brand: &str) -> Self {
        Self {
            sources,
            labels,
            brand: Arc::from(brand),
        }
    }
}

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(reports::router())
        .merge(health::router())
        .with_state(state)
}

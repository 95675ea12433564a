use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use crate::handlers::{contact_handler, health_handler, metrics_handler};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/contact", post(contact_handler)) // rate limited
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Registry
        .route("/api/v1/equipment", post(handlers::register_equipment))
        .route("/api/v1/equipment/events", get(handlers::stream_events))
        .route("/api/v1/equipment/:id", get(handlers::get_equipment))

        .with_state(state)
}

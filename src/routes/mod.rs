//! HTTP surface: router assembly and shared state.

pub mod order;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::engine::ReconciliationEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: ReconciliationEngine,
    pub jwt_secret: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/order", order::router())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "bazaar-api"}))
}

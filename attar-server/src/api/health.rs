//! Health check endpoint

use crate::core::ServerState;
use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::ApiResponse;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub environment: String,
}

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<ServerState>) -> ApiResponse<Health> {
    ApiResponse::success(Health {
        status: "ok",
        environment: state.config.environment.clone(),
    })
}

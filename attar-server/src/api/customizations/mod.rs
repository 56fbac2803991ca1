//! Customization API Module

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

/// Customization router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/customizations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Pricing preview is public
        .route("/calculate-price", post(handler::calculate_price))
        .route("/", post(handler::create))
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}", put(handler::update))
        .route("/{id}", delete(handler::remove))
}

//! Cart API Module

mod handler;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::core::ServerState;

/// Cart router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart))
        .route("/", delete(handler::clear_cart))
        .route("/items", post(handler::add_item))
        .route("/items/{id}", put(handler::update_item))
        .route("/items/{id}", delete(handler::remove_item))
}

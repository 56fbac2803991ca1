//! Order API Module
//!
//! Checkout, order tracking, payment initiation/confirmation, cancellation
//! and the gateway webhook.

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Gateway webhook (raw body, signature-verified)
        .route("/webhook", post(handler::webhook))
        .route("/", post(handler::create))
        .route("/", get(handler::list))
        .route("/myorders", get(handler::my_orders))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/cancel", put(handler::cancel))
        .route("/{id}/pay", post(handler::pay))
        .route("/{id}/confirm-payment", post(handler::confirm_payment))
}

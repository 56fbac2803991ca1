//! API route modules
//!
//! # Structure
//!
//! - [`health`] - liveness probe
//! - [`cart`] - cart operations
//! - [`orders`] - checkout, order tracking, payments, webhook
//! - [`customizations`] - perfume customizations and price quotes
//! - [`products`] - read-only catalog access

pub mod cart;
pub mod customizations;
pub mod health;
pub mod orders;
pub mod products;

use crate::core::ServerState;
use axum::Router;

/// The full API router
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(customizations::router())
        .merge(products::router())
}

//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::cart;
use crate::core::ServerState;
use shared::error::{ApiResponse, AppResult};
use shared::models::{Cart, CartAddItem};

/// Get the caller's cart, creating an empty one on first access
pub async fn get_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Cart>> {
    let cart = cart::get(&state.db, user.id).await?;
    Ok(ApiResponse::success(cart))
}

/// Add a product or customization
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartAddItem>,
) -> AppResult<ApiResponse<Cart>> {
    let cart = cart::add_item(&state.db, user.id, &payload).await?;
    Ok(ApiResponse::success(cart))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Change a line's quantity (zero or less removes it)
pub async fn update_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<ApiResponse<Cart>> {
    let cart = cart::update_quantity(&state.db, user.id, id, payload.quantity).await?;
    Ok(ApiResponse::success(cart))
}

/// Remove a line
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Cart>> {
    let cart = cart::remove_item(&state.db, user.id, id).await?;
    Ok(ApiResponse::success(cart))
}

/// Empty the cart
pub async fn clear_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Cart>> {
    let cart = cart::clear(&state.db, user.id).await?;
    Ok(ApiResponse::success(cart))
}

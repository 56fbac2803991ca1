//! Order API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::orders;
use crate::payments::{self, PaymentInitiation};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderStatus};

/// Create an order from the caller's cart
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<orders::CreateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = orders::create_order(&state.db, user.id, &payload).await?;
    Ok(ApiResponse::success(order))
}

/// List all orders (admin)
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Order>>> {
    user.require_admin()?;
    let orders = order_repo::find_all(&state.db).await?;
    Ok(ApiResponse::success(orders))
}

/// List the caller's own orders
pub async fn my_orders(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let orders = order_repo::find_by_user(&state.db, user.id).await?;
    Ok(ApiResponse::success(orders))
}

/// Get a single order (owner or admin)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Order>> {
    let order = order_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::OrderNotFound, format!("Order {id} not found"))
        })?;
    user.require_owner(order.user_id, "access this order")?;
    Ok(ApiResponse::success(order))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Admin fulfillment transition
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = orders::update_order_status(&state.db, &user, id, payload.status).await?;
    Ok(ApiResponse::success(order))
}

/// Cancel an order, restoring reserved stock
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Order>> {
    let order = orders::cancel_order(&state.db, &user, id).await?;
    Ok(ApiResponse::success(order))
}

/// Initiate payment for an order
pub async fn pay(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<PaymentInitiation>> {
    let initiation = payments::initiate(&state, &user, id).await?;
    Ok(ApiResponse::success(initiation))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Confirm an out-of-band payment (owner or admin)
pub async fn confirm_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order = payments::confirm(&state.db, &user, id, payload.transaction_id).await?;
    Ok(ApiResponse::success(order))
}

/// Gateway webhook: verify the signature over the raw body, then reconcile
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|h| h.to_str().ok());
    payments::webhook::process(
        &state.db,
        state.config.stripe_webhook_secret.as_deref(),
        signature,
        &body,
    )
    .await?;
    Ok(ApiResponse::success(serde_json::json!({ "received": true })))
}

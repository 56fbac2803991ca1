//! Admin order-status transitions
//!
//! Moving an order to `delivered` also completes its payment; that is the
//! state machine's own table speaking ([`OrderStatus::payment_side_effect`]),
//! modeling cash-on-delivery collection. Cancellation is not reachable from
//! here; it goes through the cancel path so stock is released.

use crate::auth::CurrentUser;
use crate::db::repository::order as order_repo;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderStatus, PaymentStatus};
use shared::util::now_millis;
use sqlx::SqlitePool;

/// Set an order's fulfillment status (admin only)
pub async fn update_order_status(
    pool: &SqlitePool,
    actor: &CurrentUser,
    order_id: i64,
    new_status: OrderStatus,
) -> AppResult<Order> {
    actor.require_admin()?;

    if new_status == OrderStatus::Cancelled {
        return Err(AppError::invalid(
            "Use the cancel endpoint to cancel an order",
        ));
    }

    let order = order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {order_id} not found"),
            )
        })?;
    if order.status == OrderStatus::Cancelled {
        return Err(AppError::new(ErrorCode::OrderAlreadyCancelled));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let now = now_millis();
    let delivered_at = (new_status == OrderStatus::Delivered).then_some(now);
    order_repo::update_status(&mut tx, order_id, new_status, delivered_at).await?;

    if let Some(PaymentStatus::Completed) = new_status.payment_side_effect() {
        // Stamped once; a payment already completed is left untouched
        order_repo::complete_payment(&mut tx, order_id, None, now).await?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::internal("order vanished during status update"))
}

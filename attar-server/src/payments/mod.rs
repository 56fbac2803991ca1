//! Payment State Machine
//!
//! Per order: `pending → completed`, `pending → failed`; `completed` is
//! terminal. A failed payment retries by re-initiating, which points the
//! order at a fresh transaction reference.
//!
//! - [`initiate`]: obtain a gateway intent (card channels) or synthesize a
//!   reference code (mobile wallet / bank transfer); cash-on-delivery waits
//!   for delivery
//! - [`confirm`]: owner/admin confirmation, used for reference-code channels
//! - [`webhook`]: asynchronous gateway reconciliation

pub mod gateway;
pub mod webhook;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::order as order_repo;
use crate::orders::money::to_decimal;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Order, PaymentStatus};
use shared::util::{now_millis, reference_code};
use sqlx::SqlitePool;

/// Result of initiating a payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub order: Order,
    /// Client-side continuation secret, card channels only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// The transaction reference the customer pays against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
}

/// Start (or restart) payment for an order
pub async fn initiate(
    state: &ServerState,
    actor: &CurrentUser,
    order_id: i64,
) -> AppResult<PaymentInitiation> {
    let pool = &state.db;
    let order = find_order(pool, order_id).await?;
    if order.user_id != actor.id {
        return Err(AppError::permission_denied(
            "Not authorized to pay for this order",
        ));
    }
    if order.payment.status == PaymentStatus::Completed {
        return Err(AppError::new(ErrorCode::OrderAlreadyPaid));
    }

    let mut client_secret = None;
    let mut payment_reference = None;

    if order.payment.method.is_card() {
        let amount_minor = minor_units(order.total_price);
        let intent = state
            .gateway
            .create_payment_intent(amount_minor, &state.config.currency, order.id)
            .await
            .map_err(|e| AppError::gateway(e.to_string()))?;
        // Only after the provider call succeeded does local state move
        order_repo::set_payment_pending(pool, order.id, &intent.id).await?;
        client_secret = intent.client_secret;
        payment_reference = Some(intent.id);
    } else if let Some(prefix) = order.payment.method.reference_prefix() {
        let code = reference_code(prefix);
        order_repo::set_payment_pending(pool, order.id, &code).await?;
        payment_reference = Some(code);
    }
    // Cash on delivery: nothing to initiate, settled at delivery time

    let order = find_order(pool, order_id).await?;
    Ok(PaymentInitiation {
        order,
        client_secret,
        payment_reference,
    })
}

/// Confirm a payment out of band (owner or admin).
///
/// Covers manual confirmation of reference-code channels; an explicit
/// transaction id replaces the stored reference.
pub async fn confirm(
    pool: &SqlitePool,
    actor: &CurrentUser,
    order_id: i64,
    transaction_id: Option<String>,
) -> AppResult<Order> {
    let order = find_order(pool, order_id).await?;
    actor.require_owner(order.user_id, "confirm payment for this order")?;
    if order.payment.status == PaymentStatus::Completed {
        return Err(AppError::new(ErrorCode::PaymentAlreadyCompleted));
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let rows =
        order_repo::complete_payment(&mut tx, order_id, transaction_id.as_deref(), now_millis())
            .await?;
    if rows == 0 {
        // Lost a race with another confirmation path
        return Err(AppError::new(ErrorCode::PaymentAlreadyCompleted));
    }
    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    tracing::info!(order_id, actor_id = actor.id, "payment confirmed");
    find_order(pool, order_id).await
}

async fn find_order(pool: &SqlitePool, order_id: i64) -> AppResult<Order> {
    order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {order_id} not found"),
            )
        })
}

/// Dollars to minor units (cents), rounded
fn minor_units(amount: f64) -> i64 {
    (to_decimal(amount) * Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(0)
}

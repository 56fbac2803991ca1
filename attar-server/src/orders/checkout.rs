//! Order Constructor
//!
//! Converts a cart into an immutable order in one database transaction:
//! stock reservation, customization transitions, order insertion and cart
//! clearing all commit together or not at all. A reservation failure on any
//! line rolls the whole attempt back: no order, no stock change, cart
//! untouched.

use crate::db::repository::{cart as cart_repo, customization as customization_repo, order as order_repo};
use crate::inventory;
use crate::orders::money::{order_totals, round2, to_decimal, to_f64};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    LineSource, Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus,
    ShippingInfo,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;
use validator::Validate;

/// Create-order payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_info: ShippingInfo,
    pub payment_method: PaymentMethod,
}

/// Convert the user's cart into an order
pub async fn create_order(
    pool: &SqlitePool,
    user_id: i64,
    req: &CreateOrderRequest,
) -> AppResult<Order> {
    req.shipping_info
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let lines = cart_repo::load_lines(&mut tx, user_id).await?;
    if lines.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty));
    }

    // Reserve every product line and transition every customization.
    // An InsufficientStock error drops the transaction, rolling back any
    // reservations already made in this loop.
    for line in &lines {
        match line.source {
            LineSource::Product { product_id } => {
                inventory::reserve(&mut tx, product_id, line.quantity).await?;
            }
            LineSource::Customization { customization_id } => {
                customization_repo::mark_ordered(&mut tx, customization_id).await?;
            }
        }
    }

    let items_price = round2(
        lines
            .iter()
            .map(|l| to_decimal(l.unit_price) * Decimal::from(l.quantity))
            .sum::<Decimal>(),
    );
    let (tax_price, shipping_price, total_price) = order_totals(items_price);

    let now = now_millis();
    let order = Order {
        id: snowflake_id(),
        user_id,
        items: lines
            .into_iter()
            .map(|line| OrderItem {
                id: snowflake_id(),
                source: line.source,
                name: line.name,
                unit_price: line.unit_price,
                quantity: line.quantity,
                image: line.image,
            })
            .collect(),
        shipping: req.shipping_info.clone(),
        payment: PaymentInfo {
            method: req.payment_method,
            status: PaymentStatus::Pending,
            transaction_id: None,
            payment_date: None,
        },
        items_price: to_f64(items_price),
        tax_price: to_f64(tax_price),
        shipping_price: to_f64(shipping_price),
        total_price: to_f64(total_price),
        status: OrderStatus::Processing,
        delivered_at: None,
        created_at: now,
    };

    order_repo::insert(&mut tx, &order).await?;
    cart_repo::clear_items(&mut tx, user_id).await?;
    cart_repo::recompute_totals(&mut tx, user_id).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    tracing::info!(
        order_id = order.id,
        user_id,
        total = order.total_price,
        method = req.payment_method.as_str(),
        "order created"
    );
    Ok(order)
}

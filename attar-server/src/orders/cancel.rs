//! Order cancellation, the checkout's inverse path
//!
//! Releases every reserved product line and flips the order to `cancelled`
//! in one transaction. The status flip is conditional, so two racing cancel
//! requests cannot both release stock.

use crate::auth::CurrentUser;
use crate::db::repository::order as order_repo;
use crate::inventory;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{LineSource, Order};
use sqlx::SqlitePool;

/// Cancel an order, restoring its reserved stock
pub async fn cancel_order(
    pool: &SqlitePool,
    actor: &CurrentUser,
    order_id: i64,
) -> AppResult<Order> {
    let order = order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {order_id} not found"),
            )
        })?;
    actor.require_owner(order.user_id, "cancel this order")?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    // Conditional flip: succeeds exactly once per cancellable order
    let rows = order_repo::cancel_if_cancellable(&mut tx, order_id).await?;
    if rows == 0 {
        return Err(AppError::new(ErrorCode::OrderNotCancellable));
    }

    for item in &order.items {
        if let LineSource::Product { product_id } = item.source {
            inventory::release(&mut tx, product_id, item.quantity).await?;
        }
    }

    tx.commit()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    tracing::info!(order_id, actor_id = actor.id, "order cancelled");

    order_repo::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::internal("order vanished during cancellation"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::cart;
    use crate::db::testing::{seed_product, stock_of, test_pool};
    use crate::orders::checkout::{CreateOrderRequest, create_order};
    use shared::models::{CartAddItem, OrderStatus, PaymentMethod, ShippingInfo};

    fn user(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            role: Role::User,
        }
    }

    fn admin() -> CurrentUser {
        CurrentUser {
            id: 9000,
            role: Role::Admin,
        }
    }

    async fn place_order(pool: &SqlitePool, user_id: i64, product_id: i64, qty: i64) -> Order {
        cart::add_item(
            pool,
            user_id,
            &CartAddItem {
                source: LineSource::Product { product_id },
                quantity: qty,
            },
        )
        .await
        .unwrap();
        create_order(
            pool,
            user_id,
            &CreateOrderRequest {
                shipping_info: ShippingInfo {
                    address: "12 Canal Road".into(),
                    city: "Lahore".into(),
                    state: "Punjab".into(),
                    country: "PK".into(),
                    zip_code: "54000".into(),
                    phone: "+92 300 0000000".into(),
                },
                payment_method: PaymentMethod::Cod,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly() {
        let pool = test_pool().await;
        let pid = seed_product(&pool, "Amber Noir", 20.0, 10).await;
        let order = place_order(&pool, 1, pid, 3).await;
        assert_eq!(stock_of(&pool, pid).await, 7);

        let cancelled = cancel_order(&pool, &user(1), order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&pool, pid).await, 10);
    }

    #[tokio::test]
    async fn test_second_cancel_rejected() {
        let pool = test_pool().await;
        let pid = seed_product(&pool, "Amber Noir", 20.0, 10).await;
        let order = place_order(&pool, 1, pid, 3).await;

        cancel_order(&pool, &user(1), order.id).await.unwrap();
        let err = cancel_order(&pool, &user(1), order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);
        // Stock released exactly once
        assert_eq!(stock_of(&pool, pid).await, 10);
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_cancels() {
        let pool = test_pool().await;
        let pid = seed_product(&pool, "Amber Noir", 20.0, 10).await;
        let order = place_order(&pool, 1, pid, 1).await;

        let err = cancel_order(&pool, &user(2), order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let cancelled = cancel_order(&pool, &admin(), order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_shipped_order_not_cancellable() {
        let pool = test_pool().await;
        let pid = seed_product(&pool, "Amber Noir", 20.0, 10).await;
        let order = place_order(&pool, 1, pid, 2).await;

        sqlx::query("UPDATE orders SET order_status = 'shipped' WHERE id = ?")
            .bind(order.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = cancel_order(&pool, &user(1), order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotCancellable);
        assert_eq!(stock_of(&pool, pid).await, 8);
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let pool = test_pool().await;
        let err = cancel_order(&pool, &user(1), 404).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }
}

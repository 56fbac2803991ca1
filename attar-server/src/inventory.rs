//! Inventory Ledger
//!
//! Owns the per-product stock counter. Reservation is a single conditional
//! update: the stock check and the decrement are one atomic statement, so
//! two concurrent reservations can never both succeed on the last unit.
//! Release is unconditional.
//!
//! Both operations take a connection so they compose into the checkout and
//! cancellation transactions.

use crate::db::repository::RepoResult;
use shared::{AppError, AppResult};
use sqlx::{SqliteConnection, SqlitePool};

/// Atomically reserve `quantity` units of a product.
///
/// Fails with `InsufficientStock` (carrying the currently available count)
/// when the stock is short at commit time.
pub async fn reserve(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> AppResult<()> {
    let rows = sqlx::query("UPDATE product SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1")
        .bind(quantity)
        .bind(product_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    if rows.rows_affected() == 0 {
        // Short or missing; read back what is actually there for the error
        let current: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM product WHERE id = ?")
                .bind(product_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| AppError::database(e.to_string()))?;
        return match current {
            Some((name, available)) => Err(AppError::insufficient_stock(name, available)),
            None => Err(AppError::with_message(
                shared::ErrorCode::ProductNotFound,
                format!("Product {product_id} not found"),
            )),
        };
    }
    Ok(())
}

/// Unconditionally return `quantity` units of a product to stock
pub async fn release(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> AppResult<()> {
    sqlx::query("UPDATE product SET stock = stock + ?1 WHERE id = ?2")
        .bind(quantity)
        .bind(product_id)
        .execute(conn)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(())
}

/// Current availability of a product. Non-binding, used by the cart's
/// advisory check; the binding reservation happens only at checkout.
pub async fn availability(pool: &SqlitePool, product_id: i64) -> RepoResult<Option<i64>> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM product WHERE id = ?")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    Ok(stock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{seed_product, stock_of, test_pool};
    use shared::ErrorCode;

    #[tokio::test]
    async fn test_reserve_decrements_stock() {
        let pool = test_pool().await;
        let id = seed_product(&pool, "Amber Noir", 80.0, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        reserve(&mut conn, id, 3).await.unwrap();
        drop(conn);

        assert_eq!(stock_of(&pool, id).await, 2);
    }

    #[tokio::test]
    async fn test_reserve_insufficient_reports_available() {
        let pool = test_pool().await;
        let id = seed_product(&pool, "Amber Noir", 80.0, 2).await;

        let mut conn = pool.acquire().await.unwrap();
        let err = reserve(&mut conn, id, 3).await.unwrap_err();
        drop(conn);

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        let details = err.details.unwrap();
        assert_eq!(details.get("available").unwrap(), 2);
        // Stock untouched
        assert_eq!(stock_of(&pool, id).await, 2);
    }

    #[tokio::test]
    async fn test_reserve_unknown_product() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let err = reserve(&mut conn, 424242, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductNotFound);
    }

    #[tokio::test]
    async fn test_release_restores_stock() {
        let pool = test_pool().await;
        let id = seed_product(&pool, "Amber Noir", 80.0, 1).await;

        let mut conn = pool.acquire().await.unwrap();
        reserve(&mut conn, id, 1).await.unwrap();
        release(&mut conn, id, 1).await.unwrap();
        drop(conn);

        assert_eq!(stock_of(&pool, id).await, 1);
    }

    #[tokio::test]
    async fn test_reserve_exact_stock_then_nothing_left() {
        let pool = test_pool().await;
        let id = seed_product(&pool, "Amber Noir", 80.0, 4).await;

        let mut conn = pool.acquire().await.unwrap();
        reserve(&mut conn, id, 4).await.unwrap();
        let err = reserve(&mut conn, id, 1).await.unwrap_err();
        drop(conn);

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.details.unwrap().get("available").unwrap(), 0);
        assert_eq!(stock_of(&pool, id).await, 0);
    }

    /// Many tasks racing for limited stock: exactly `stock` reservations
    /// succeed and the counter never goes negative.
    #[tokio::test]
    async fn test_concurrent_reserves_never_oversell() {
        let pool = test_pool().await;
        let id = seed_product(&pool, "Amber Noir", 80.0, 5).await;

        let tasks = (0..12).map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                reserve(&mut conn, id, 1).await.is_ok()
            })
        });
        let results = futures::future::join_all(tasks).await;
        let succeeded = results
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();

        assert_eq!(succeeded, 5);
        assert_eq!(stock_of(&pool, id).await, 0);
    }

    #[tokio::test]
    async fn test_availability() {
        let pool = test_pool().await;
        let id = seed_product(&pool, "Amber Noir", 80.0, 7).await;
        assert_eq!(availability(&pool, id).await.unwrap(), Some(7));
        assert_eq!(availability(&pool, 999).await.unwrap(), None);
    }
}

//! Product Repository
//!
//! The catalog is read-only from the engine's perspective; stock moves only
//! through the inventory ledger.

use super::RepoResult;
use shared::models::Product;
use sqlx::SqlitePool;

const SELECT: &str = "SELECT id, name, description, brand, gender, category, price, \
     discount_price, discount_percent, size_ml, stock, image, is_active, \
     created_at, updated_at FROM product";

/// Find all active products
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let sql = format!("{SELECT} WHERE is_active = 1 ORDER BY name");
    let products = sqlx::query_as::<_, Product>(&sql).fetch_all(pool).await?;
    Ok(products)
}

/// Find a product by id
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

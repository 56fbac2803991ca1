//! Cart Repository
//!
//! Row-level access to the `cart` and `cart_item` tables. The totals columns
//! are derived: every mutation path goes through [`recompute_totals`], which
//! is the only writer of `total_items` / `total_price`.

use super::{RepoError, RepoResult};
use shared::models::{Cart, CartLine, LineSource};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

const LINE_SELECT: &str = "SELECT id, user_id, item_type, product_id, customization_id, name, \
     unit_price, quantity, image, created_at FROM cart_item";

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    item_type: String,
    product_id: Option<i64>,
    customization_id: Option<i64>,
    name: String,
    unit_price: f64,
    quantity: i64,
    image: Option<String>,
}

impl TryFrom<CartItemRow> for CartLine {
    type Error = RepoError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let source = match (row.item_type.as_str(), row.product_id, row.customization_id) {
            ("product", Some(product_id), None) => LineSource::Product { product_id },
            ("customization", None, Some(customization_id)) => {
                LineSource::Customization { customization_id }
            }
            _ => {
                return Err(RepoError::Database(format!(
                    "cart_item {} has inconsistent item references",
                    row.id
                )));
            }
        };
        Ok(CartLine {
            id: row.id,
            source,
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            image: row.image,
        })
    }
}

/// Create the user's cart row if it does not exist yet
pub async fn ensure(pool: &SqlitePool, user_id: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO cart (user_id, total_items, total_price, created_at, updated_at) \
         VALUES (?1, 0, 0, ?2, ?2)",
    )
    .bind(user_id)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether the user has a cart row at all
pub async fn exists(pool: &SqlitePool, user_id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cart WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Load a cart with its lines; the cart row must exist
pub async fn fetch(pool: &SqlitePool, user_id: i64) -> RepoResult<Cart> {
    let (total_items, total_price, created_at, updated_at): (i64, f64, i64, i64) =
        sqlx::query_as(
            "SELECT total_items, total_price, created_at, updated_at FROM cart WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Cart for user {user_id} not found")))?;

    let mut conn = pool.acquire().await?;
    let items = load_lines(&mut conn, user_id).await?;

    Ok(Cart {
        user_id,
        items,
        total_items,
        total_price,
        created_at,
        updated_at,
    })
}

/// Load the cart lines in insertion order
pub async fn load_lines(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<Vec<CartLine>> {
    let sql = format!("{LINE_SELECT} WHERE user_id = ? ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    rows.into_iter().map(CartLine::try_from).collect()
}

/// Find a line by id within a user's cart
pub async fn find_line(
    pool: &SqlitePool,
    user_id: i64,
    line_id: i64,
) -> RepoResult<Option<CartLine>> {
    let sql = format!("{LINE_SELECT} WHERE user_id = ? AND id = ?");
    let row = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(user_id)
        .bind(line_id)
        .fetch_optional(pool)
        .await?;
    row.map(CartLine::try_from).transpose()
}

/// Find the line backed by a given catalog product, if any
pub async fn find_line_by_product(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
) -> RepoResult<Option<CartLine>> {
    let sql = format!("{LINE_SELECT} WHERE user_id = ? AND product_id = ?");
    let row = sqlx::query_as::<_, CartItemRow>(&sql)
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    row.map(CartLine::try_from).transpose()
}

/// Insert a new cart line
pub async fn insert_line(
    pool: &SqlitePool,
    user_id: i64,
    source: &LineSource,
    name: &str,
    unit_price: f64,
    quantity: i64,
    image: Option<&str>,
) -> RepoResult<i64> {
    let id = snowflake_id();
    let (product_id, customization_id) = match source {
        LineSource::Product { product_id } => (Some(*product_id), None),
        LineSource::Customization { customization_id } => (None, Some(*customization_id)),
    };
    sqlx::query(
        "INSERT INTO cart_item (id, user_id, item_type, product_id, customization_id, name, \
         unit_price, quantity, image, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(id)
    .bind(user_id)
    .bind(source.type_name())
    .bind(product_id)
    .bind(customization_id)
    .bind(name)
    .bind(unit_price)
    .bind(quantity)
    .bind(image)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(id)
}

/// Set a line's quantity
pub async fn set_line_quantity(pool: &SqlitePool, line_id: i64, quantity: i64) -> RepoResult<()> {
    sqlx::query("UPDATE cart_item SET quantity = ? WHERE id = ?")
        .bind(quantity)
        .bind(line_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a line
pub async fn delete_line(pool: &SqlitePool, line_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE id = ?")
        .bind(line_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Delete a line only if it belongs to the user's cart
pub async fn delete_line_of_user(
    pool: &SqlitePool,
    user_id: i64,
    line_id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE id = ? AND user_id = ?")
        .bind(line_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Remove every line of a cart within the caller's transaction
pub async fn clear_items(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<()> {
    sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Recompute the derived totals from the lines.
///
/// Sole writer of `total_items` and `total_price`.
pub async fn recompute_totals(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<()> {
    sqlx::query(
        "UPDATE cart SET \
         total_items = (SELECT COALESCE(SUM(quantity), 0) FROM cart_item WHERE user_id = ?1), \
         total_price = (SELECT COALESCE(SUM(unit_price * quantity), 0) FROM cart_item \
                        WHERE user_id = ?1), \
         updated_at = ?2 \
         WHERE user_id = ?1",
    )
    .bind(user_id)
    .bind(now_millis())
    .execute(conn)
    .await?;
    Ok(())
}

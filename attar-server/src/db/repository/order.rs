//! Order Repository
//!
//! Orders are written once inside the checkout transaction; afterwards only
//! the status and payment columns move, always through guarded updates.

use super::{RepoError, RepoResult};
use shared::models::{
    LineSource, Order, OrderItem, OrderStatus, PaymentInfo, ShippingInfo,
};
use shared::util::snowflake_id;
use sqlx::{SqliteConnection, SqlitePool};

const SELECT: &str = "SELECT id, user_id, address, city, state, country, zip_code, phone, \
     payment_method, payment_status, transaction_id, payment_date, items_price, tax_price, \
     shipping_price, total_price, order_status, delivered_at, created_at FROM orders";

const ITEM_SELECT: &str = "SELECT id, order_id, item_type, product_id, customization_id, name, \
     unit_price, quantity, image FROM order_item";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    address: String,
    city: String,
    state: String,
    country: String,
    zip_code: String,
    phone: String,
    payment_method: String,
    payment_status: String,
    transaction_id: Option<String>,
    payment_date: Option<i64>,
    items_price: f64,
    tax_price: f64,
    shipping_price: f64,
    total_price: f64,
    order_status: String,
    delivered_at: Option<i64>,
    created_at: i64,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> RepoResult<Order> {
        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            items,
            shipping: ShippingInfo {
                address: self.address,
                city: self.city,
                state: self.state,
                country: self.country,
                zip_code: self.zip_code,
                phone: self.phone,
            },
            payment: PaymentInfo {
                method: self.payment_method.parse()?,
                status: self.payment_status.parse()?,
                transaction_id: self.transaction_id,
                payment_date: self.payment_date,
            },
            items_price: self.items_price,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            status: self.order_status.parse()?,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    item_type: String,
    product_id: Option<i64>,
    customization_id: Option<i64>,
    name: String,
    unit_price: f64,
    quantity: i64,
    image: Option<String>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepoError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let source = match (row.item_type.as_str(), row.product_id, row.customization_id) {
            ("product", Some(product_id), None) => LineSource::Product { product_id },
            ("customization", None, Some(customization_id)) => {
                LineSource::Customization { customization_id }
            }
            _ => {
                return Err(RepoError::Database(format!(
                    "order_item {} has inconsistent item references",
                    row.id
                )));
            }
        };
        Ok(OrderItem {
            id: row.id,
            source,
            name: row.name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            image: row.image,
        })
    }
}

/// Insert an order and its frozen items within the caller's transaction
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, user_id, address, city, state, country, zip_code, phone, \
         payment_method, payment_status, transaction_id, payment_date, items_price, tax_price, \
         shipping_price, total_price, order_status, delivered_at, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
         ?18, ?19)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.shipping.address)
    .bind(&order.shipping.city)
    .bind(&order.shipping.state)
    .bind(&order.shipping.country)
    .bind(&order.shipping.zip_code)
    .bind(&order.shipping.phone)
    .bind(order.payment.method.as_str())
    .bind(order.payment.status.as_str())
    .bind(&order.payment.transaction_id)
    .bind(order.payment.payment_date)
    .bind(order.items_price)
    .bind(order.tax_price)
    .bind(order.shipping_price)
    .bind(order.total_price)
    .bind(order.status.as_str())
    .bind(order.delivered_at)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        let (product_id, customization_id) = match item.source {
            LineSource::Product { product_id } => (Some(product_id), None),
            LineSource::Customization { customization_id } => (None, Some(customization_id)),
        };
        sqlx::query(
            "INSERT INTO order_item (id, order_id, item_type, product_id, customization_id, \
             name, unit_price, quantity, image) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(if item.id != 0 { item.id } else { snowflake_id() })
        .bind(order.id)
        .bind(item.source.type_name())
        .bind(product_id)
        .bind(customization_id)
        .bind(&item.name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(&item.image)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let sql = format!("{ITEM_SELECT} WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(order_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(OrderItem::try_from).collect()
}

/// Find an order by id, with its items
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("{SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let items = load_items(pool, row.id).await?;
            Ok(Some(row.into_order(items)?))
        }
        None => Ok(None),
    }
}

/// Find the order holding a gateway transaction id
pub async fn find_by_transaction(
    pool: &SqlitePool,
    transaction_id: &str,
) -> RepoResult<Option<Order>> {
    let sql = format!("{SELECT} WHERE transaction_id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(transaction_id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => {
            let items = load_items(pool, row.id).await?;
            Ok(Some(row.into_order(items)?))
        }
        None => Ok(None),
    }
}

/// All orders of one user, newest first
pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Order>> {
    let sql = format!("{SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = load_items(pool, row.id).await?;
        orders.push(row.into_order(items)?);
    }
    Ok(orders)
}

/// All orders, newest first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Order>> {
    let sql = format!("{SELECT} ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, OrderRow>(&sql).fetch_all(pool).await?;
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = load_items(pool, row.id).await?;
        orders.push(row.into_order(items)?);
    }
    Ok(orders)
}

/// Set the fulfillment status within the caller's transaction
pub async fn update_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: OrderStatus,
    delivered_at: Option<i64>,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET order_status = ?, delivered_at = COALESCE(?, delivered_at) WHERE id = ?")
        .bind(status.as_str())
        .bind(delivered_at)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Point payment tracking at a new transaction reference and reset it to
/// `pending` (initiation, and re-initiation after a failure)
pub async fn set_payment_pending(
    pool: &SqlitePool,
    id: i64,
    transaction_id: &str,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE orders SET payment_status = 'pending', transaction_id = ?, payment_date = NULL \
         WHERE id = ?",
    )
    .bind(transaction_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Complete the payment within the caller's transaction; an explicit
/// transaction id overwrites the stored one. Guarded: an already-completed
/// payment is left untouched (0 rows), so the payment date is stamped once.
pub async fn complete_payment(
    conn: &mut SqliteConnection,
    id: i64,
    transaction_id: Option<&str>,
    paid_at: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = 'completed', payment_date = ?, \
         transaction_id = COALESCE(?, transaction_id) \
         WHERE id = ? AND payment_status != 'completed'",
    )
    .bind(paid_at)
    .bind(transaction_id)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected())
}

/// Flip an order to `cancelled` only while it is still cancellable.
/// Returns 0 rows when the order is absent or already past that point;
/// the caller distinguishes the two.
pub async fn cancel_if_cancellable(conn: &mut SqliteConnection, id: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE orders SET order_status = 'cancelled' \
         WHERE id = ? AND order_status IN ('processing', 'confirmed')",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected())
}

/// Webhook success: complete the payment for a transaction id unless it is
/// already completed. Returns the number of rows changed (0 = unknown id or
/// replay).
pub async fn complete_payment_by_transaction(
    pool: &SqlitePool,
    transaction_id: &str,
    paid_at: i64,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = 'completed', payment_date = ? \
         WHERE transaction_id = ? AND payment_status != 'completed'",
    )
    .bind(paid_at)
    .bind(transaction_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

/// Webhook failure: mark the payment failed unless it already completed.
/// A stale failure event never downgrades a completed payment.
pub async fn fail_payment_by_transaction(
    pool: &SqlitePool,
    transaction_id: &str,
) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_status = 'failed' \
         WHERE transaction_id = ? AND payment_status != 'completed'",
    )
    .bind(transaction_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

//! Cart Store
//!
//! Per-user mutable pre-order collection. Rules enforced here:
//! - adding a catalog product checks current availability (advisory; the
//!   binding reservation happens at checkout) and merges into an existing
//!   line for the same product
//! - adding a customization requires ownership and never merges: each
//!   customization instance keeps its own line
//! - quantity updates of zero or less remove the line
//! - derived totals are recomputed on every mutation

use crate::db::repository::{cart as cart_repo, customization as customization_repo, product as product_repo};
use crate::inventory;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Cart, CartAddItem, LineSource};
use sqlx::SqlitePool;

/// Load the user's cart, creating an empty one on first access
pub async fn get(pool: &SqlitePool, user_id: i64) -> AppResult<Cart> {
    cart_repo::ensure(pool, user_id).await?;
    Ok(cart_repo::fetch(pool, user_id).await?)
}

/// Add a product or customization to the cart
pub async fn add_item(pool: &SqlitePool, user_id: i64, req: &CartAddItem) -> AppResult<Cart> {
    if req.quantity < 1 {
        return Err(AppError::validation("Quantity must be at least 1"));
    }
    cart_repo::ensure(pool, user_id).await?;

    match req.source {
        LineSource::Product { product_id } => {
            let product = product_repo::find_by_id(pool, product_id)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(ErrorCode::ProductNotFound, "Product not found")
                })?;
            if product.stock < req.quantity {
                return Err(AppError::insufficient_stock(product.name, product.stock));
            }

            // Same catalog product merges into one line
            match cart_repo::find_line_by_product(pool, user_id, product_id).await? {
                Some(line) => {
                    cart_repo::set_line_quantity(pool, line.id, line.quantity + req.quantity)
                        .await?;
                }
                None => {
                    let image = if product.image.is_empty() {
                        None
                    } else {
                        Some(product.image.as_str())
                    };
                    cart_repo::insert_line(
                        pool,
                        user_id,
                        &req.source,
                        &product.name,
                        product.final_price(),
                        req.quantity,
                        image,
                    )
                    .await?;
                }
            }
        }
        LineSource::Customization { customization_id } => {
            let customization = customization_repo::find_by_id(pool, customization_id)
                .await?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::CustomizationNotFound,
                        "Customization not found",
                    )
                })?;
            if customization.user_id != user_id {
                return Err(AppError::permission_denied(
                    "Not authorized to add this customization to cart",
                ));
            }

            // Customizations carry independent identity; never merged
            cart_repo::insert_line(
                pool,
                user_id,
                &req.source,
                &customization.name,
                customization.unit_price(),
                req.quantity,
                customization.image.as_deref(),
            )
            .await?;
        }
    }

    refresh(pool, user_id).await
}

/// Change a line's quantity; zero or less removes the line
pub async fn update_quantity(
    pool: &SqlitePool,
    user_id: i64,
    line_id: i64,
    quantity: i64,
) -> AppResult<Cart> {
    require_cart(pool, user_id).await?;
    let line = cart_repo::find_line(pool, user_id, line_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CartItemNotFound))?;

    if quantity <= 0 {
        cart_repo::delete_line(pool, line.id).await?;
        return refresh(pool, user_id).await;
    }

    if let LineSource::Product { product_id } = line.source {
        match inventory::availability(pool, product_id).await? {
            Some(available) if available < quantity => {
                return Err(AppError::insufficient_stock(line.name, available));
            }
            _ => {}
        }
    }
    cart_repo::set_line_quantity(pool, line.id, quantity).await?;
    refresh(pool, user_id).await
}

/// Remove a line
pub async fn remove_item(pool: &SqlitePool, user_id: i64, line_id: i64) -> AppResult<Cart> {
    require_cart(pool, user_id).await?;
    let removed = cart_repo::delete_line_of_user(pool, user_id, line_id).await?;
    if !removed {
        return Err(AppError::new(ErrorCode::CartItemNotFound));
    }
    refresh(pool, user_id).await
}

/// Empty the cart
pub async fn clear(pool: &SqlitePool, user_id: i64) -> AppResult<Cart> {
    require_cart(pool, user_id).await?;
    let mut conn = pool.acquire().await.map_err(|e| AppError::database(e.to_string()))?;
    cart_repo::clear_items(&mut conn, user_id).await?;
    drop(conn);
    refresh(pool, user_id).await
}

async fn require_cart(pool: &SqlitePool, user_id: i64) -> AppResult<()> {
    if !cart_repo::exists(pool, user_id).await? {
        return Err(AppError::new(ErrorCode::CartNotFound));
    }
    Ok(())
}

async fn refresh(pool: &SqlitePool, user_id: i64) -> AppResult<Cart> {
    let mut conn = pool.acquire().await.map_err(|e| AppError::database(e.to_string()))?;
    cart_repo::recompute_totals(&mut conn, user_id).await?;
    drop(conn);
    Ok(cart_repo::fetch(pool, user_id).await?)
}

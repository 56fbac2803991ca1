//! Product API Handlers

use axum::extract::{Path, State};

use crate::core::ServerState;
use crate::db::repository::product as product_repo;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::Product;

/// List active products
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Product>>> {
    let products = product_repo::find_all(&state.db).await?;
    Ok(ApiResponse::success(products))
}

/// Get a product by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Product>> {
    let product = product_repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::ProductNotFound, format!("Product {id} not found"))
        })?;
    Ok(ApiResponse::success(product))
}

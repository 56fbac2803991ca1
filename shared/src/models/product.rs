//! Product Model

use serde::{Deserialize, Serialize};

/// Catalog product entity
///
/// The catalog is maintained elsewhere; the commerce engine reads products
/// and mutates only the `stock` counter through the inventory ledger.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub brand: String,
    /// Target audience: male | female | unisex
    pub gender: String,
    /// perfume | cologne | body mist | attar
    pub category: String,
    /// List price in dollars
    pub price: f64,
    /// Explicit discounted price, takes precedence over the percentage
    pub discount_price: Option<f64>,
    /// Percentage discount off the list price (0-100)
    pub discount_percent: Option<f64>,
    /// Bottle size in millilitres
    pub size_ml: i64,
    /// Available stock, mutated only by the inventory ledger
    pub stock: i64,
    pub image: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Effective selling price after discounts
    pub fn final_price(&self) -> f64 {
        if let Some(discounted) = self.discount_price {
            return discounted;
        }
        if let Some(percent) = self.discount_percent {
            return self.price * (1.0 - percent / 100.0);
        }
        self.price
    }
}

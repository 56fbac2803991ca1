//! Cart Model
//!
//! A cart is a per-user mutable collection of line items. Each line is
//! backed by either a catalog product or a customization (exactly one),
//! expressed as a tagged variant rather than two optional references.

use serde::{Deserialize, Serialize};

/// What a cart line is backed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "lowercase")]
pub enum LineSource {
    Product { product_id: i64 },
    Customization { customization_id: i64 },
}

impl LineSource {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Product { .. } => "product",
            Self::Customization { .. } => "customization",
        }
    }
}

/// A single cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    #[serde(flatten)]
    pub source: LineSource,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub image: Option<String>,
}

impl CartLine {
    /// Line total (`unit_price × quantity`)
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Add-to-cart payload: the backing reference plus a quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartAddItem {
    #[serde(flatten)]
    pub source: LineSource,
    pub quantity: i64,
}

/// A user's cart with derived totals
///
/// `total_items` and `total_price` are recomputed from the lines on every
/// mutation; no other write path may set them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: i64,
    pub items: Vec<CartLine>,
    pub total_items: i64,
    pub total_price: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

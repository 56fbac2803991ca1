//! Money calculation utilities using rust_decimal for precision
//!
//! Monetary values are stored as `f64` dollars; every calculation goes
//! through `Decimal` and is rounded to two places before storage.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Tax applied on the items subtotal (15%)
pub const TAX_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Orders strictly above this subtotal ship free
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Flat shipping fee below the threshold
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Convert an f64 amount to Decimal for calculation
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert a Decimal back to f64 for storage/serialization
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Round to two decimal places
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Derive tax, shipping and grand total from an items subtotal
pub fn order_totals(items_price: Decimal) -> (Decimal, Decimal, Decimal) {
    let tax = round2(items_price * TAX_RATE);
    let shipping = if items_price > FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    };
    let total = round2(items_price + tax + shipping);
    (tax, shipping, total)
}

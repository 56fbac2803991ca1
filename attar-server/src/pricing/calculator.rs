//! Customization price calculator
//!
//! A pure function over an immutable table set: selection in, price
//! breakdown out. No storage access.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    BottleMaterial, BottleSize, BottleStyle, CustomizationSelection, FragranceType, Intensity,
    Packaging, PriceBreakdown,
};
use serde::Serialize;
use std::collections::HashMap;

/// Bounds on the per-customization quantity
pub const MIN_QUANTITY: i64 = 1;
pub const MAX_QUANTITY: i64 = 10;

/// Immutable pricing tables, injected into the calculator at construction.
///
/// The enums form closed sets, so an unknown key is rejected when the
/// request is deserialized; a missing table entry is a configuration error.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    base_prices: HashMap<FragranceType, Decimal>,
    bottle_upgrades: HashMap<BottleStyle, Decimal>,
    intensity_upgrades: HashMap<Intensity, Decimal>,
    size_multipliers: HashMap<BottleSize, Decimal>,
    material_upgrades: HashMap<BottleMaterial, Decimal>,
    packaging_upgrades: HashMap<Packaging, Decimal>,
    label_fee: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_prices: HashMap::from([
                (FragranceType::Floral, Decimal::from(50)),
                (FragranceType::Woody, Decimal::from(60)),
                (FragranceType::Fresh, Decimal::from(45)),
                (FragranceType::Oriental, Decimal::from(70)),
                (FragranceType::Citrus, Decimal::from(40)),
                (FragranceType::Spicy, Decimal::from(65)),
            ]),
            bottle_upgrades: HashMap::from([
                (BottleStyle::Classic, Decimal::ZERO),
                (BottleStyle::Modern, Decimal::from(10)),
                (BottleStyle::Vintage, Decimal::from(15)),
                (BottleStyle::Luxury, Decimal::from(30)),
                (BottleStyle::Minimalist, Decimal::from(5)),
            ]),
            intensity_upgrades: HashMap::from([
                (Intensity::Light, Decimal::ZERO),
                (Intensity::Medium, Decimal::from(5)),
                (Intensity::Strong, Decimal::from(10)),
            ]),
            size_multipliers: HashMap::from([
                (BottleSize::Ml30, Decimal::ONE),
                (BottleSize::Ml50, Decimal::new(15, 1)),
                (BottleSize::Ml100, Decimal::new(25, 1)),
                (BottleSize::Ml200, Decimal::from(4)),
            ]),
            material_upgrades: HashMap::from([
                (BottleMaterial::Glass, Decimal::ZERO),
                (BottleMaterial::Crystal, Decimal::from(20)),
                (BottleMaterial::Plastic, Decimal::from(-5)),
            ]),
            packaging_upgrades: HashMap::from([
                (Packaging::Standard, Decimal::ZERO),
                (Packaging::Premium, Decimal::from(15)),
                (Packaging::Gift, Decimal::from(25)),
            ]),
            label_fee: Decimal::from(5),
        }
    }
}

/// A priced selection
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub price_breakdown: PriceBreakdown,
    pub unit_price: f64,
    pub total_price: f64,
}

impl PricingConfig {
    fn lookup<K: std::hash::Hash + Eq + std::fmt::Debug>(
        table: &HashMap<K, Decimal>,
        key: &K,
    ) -> AppResult<Decimal> {
        table.get(key).copied().ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ConfigError,
                format!("missing pricing table entry for {key:?}"),
            )
        })
    }

    /// Price a selection.
    ///
    /// The size multiplier applies to the base price and the bottle,
    /// fragrance and material upgrades; packaging and label fees are flat
    /// per-unit add-ons.
    pub fn quote(&self, selection: &CustomizationSelection, quantity: i64) -> AppResult<Quote> {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
            return Err(AppError::validation(format!(
                "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
            )));
        }

        let multiplier = Self::lookup(&self.size_multipliers, &selection.bottle.size)?;
        let base = Self::lookup(&self.base_prices, &selection.fragrance.fragrance_type)?;
        let bottle = Self::lookup(&self.bottle_upgrades, &selection.bottle.style)?;
        let intensity = Self::lookup(&self.intensity_upgrades, &selection.fragrance.intensity)?;
        let material = Self::lookup(&self.material_upgrades, &selection.bottle.material)?;
        let packaging = Self::lookup(&self.packaging_upgrades, &selection.packaging)?;
        let label = if selection.label.has_text() {
            self.label_fee
        } else {
            Decimal::ZERO
        };

        let scaled = |d: Decimal| round2(d * multiplier);
        let breakdown = PriceBreakdown {
            base_price: to_f64(scaled(base)),
            bottle_upgrade: to_f64(scaled(bottle)),
            fragrance_upgrade: to_f64(scaled(intensity)),
            material_upgrade: to_f64(scaled(material)),
            packaging_upgrade: to_f64(packaging),
            label_customization: to_f64(label),
        };

        let unit = round2(
            scaled(base) + scaled(bottle) + scaled(intensity) + scaled(material) + packaging
                + label,
        );
        let total = round2(unit * Decimal::from(quantity));

        Ok(Quote {
            price_breakdown: breakdown,
            unit_price: to_f64(unit),
            total_price: to_f64(total),
        })
    }
}

fn round2(d: Decimal) -> Decimal {
    d.round_dp(2)
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

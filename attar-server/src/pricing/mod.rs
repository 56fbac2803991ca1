//! Pricing Calculator
//!
//! Stateless pricing of customizations from immutable configuration tables.

mod calculator;

pub use calculator::{MAX_QUANTITY, MIN_QUANTITY, PricingConfig, Quote};

//! Domain models for the Attar commerce platform

pub mod cart;
pub mod customization;
pub mod order;
pub mod product;

pub use cart::{Cart, CartAddItem, CartLine, LineSource};
pub use customization::{
    BottleMaterial, BottleSelection, BottleSize, BottleStyle, Customization, CustomizationCreate,
    CustomizationSelection, CustomizationStatus, CustomizationUpdate, FragranceSelection,
    FragranceType, Intensity, LabelFont, LabelSelection, Packaging, PriceBreakdown,
};
pub use order::{
    Order, OrderItem, OrderStatus, PaymentInfo, PaymentMethod, PaymentStatus, ShippingInfo,
};
pub use product::Product;

use thiserror::Error;

/// Error returned when parsing an enum from its stored string form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value: {0}")]
pub struct InvalidValue(pub String);

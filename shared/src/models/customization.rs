//! Customization Model
//!
//! A customization is a user-configured perfume: fragrance, bottle, label
//! and packaging choices priced by the pricing calculator. It has its own
//! identity independent of catalog products and a monotonic lifecycle
//! (`draft` → `completed` → `ordered`).

use super::InvalidValue;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fragrance family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragranceType {
    Floral,
    Woody,
    Fresh,
    Oriental,
    Citrus,
    Spicy,
}

impl FragranceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Floral => "floral",
            Self::Woody => "woody",
            Self::Fresh => "fresh",
            Self::Oriental => "oriental",
            Self::Citrus => "citrus",
            Self::Spicy => "spicy",
        }
    }
}

impl FromStr for FragranceType {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "floral" => Ok(Self::Floral),
            "woody" => Ok(Self::Woody),
            "fresh" => Ok(Self::Fresh),
            "oriental" => Ok(Self::Oriental),
            "citrus" => Ok(Self::Citrus),
            "spicy" => Ok(Self::Spicy),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Fragrance concentration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    #[default]
    Medium,
    Strong,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Strong => "strong",
        }
    }
}

impl FromStr for Intensity {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Self::Light),
            "medium" => Ok(Self::Medium),
            "strong" => Ok(Self::Strong),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Bottle shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleStyle {
    Classic,
    Modern,
    Vintage,
    Luxury,
    Minimalist,
}

impl BottleStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Modern => "modern",
            Self::Vintage => "vintage",
            Self::Luxury => "luxury",
            Self::Minimalist => "minimalist",
        }
    }
}

impl FromStr for BottleStyle {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Self::Classic),
            "modern" => Ok(Self::Modern),
            "vintage" => Ok(Self::Vintage),
            "luxury" => Ok(Self::Luxury),
            "minimalist" => Ok(Self::Minimalist),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Bottle material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BottleMaterial {
    #[default]
    Glass,
    Crystal,
    Plastic,
}

impl BottleMaterial {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Glass => "glass",
            Self::Crystal => "crystal",
            Self::Plastic => "plastic",
        }
    }
}

impl FromStr for BottleMaterial {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glass" => Ok(Self::Glass),
            "crystal" => Ok(Self::Crystal),
            "plastic" => Ok(Self::Plastic),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Bottle volume in millilitres, a fixed set rather than a free integer.
///
/// Serialized as the bare number (`30`, `50`, `100`, `200`); any other
/// value is rejected at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BottleSize {
    Ml30,
    Ml50,
    Ml100,
    Ml200,
}

impl BottleSize {
    pub fn millilitres(&self) -> u16 {
        match self {
            Self::Ml30 => 30,
            Self::Ml50 => 50,
            Self::Ml100 => 100,
            Self::Ml200 => 200,
        }
    }
}

impl TryFrom<u16> for BottleSize {
    type Error = InvalidValue;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            30 => Ok(Self::Ml30),
            50 => Ok(Self::Ml50),
            100 => Ok(Self::Ml100),
            200 => Ok(Self::Ml200),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

impl From<BottleSize> for u16 {
    fn from(size: BottleSize) -> Self {
        size.millilitres()
    }
}

/// Packaging tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    #[default]
    Standard,
    Premium,
    Gift,
}

impl Packaging {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Gift => "gift",
        }
    }
}

impl FromStr for Packaging {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            "gift" => Ok(Self::Gift),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Label typeface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LabelFont {
    #[serde(rename = "serif")]
    Serif,
    #[default]
    #[serde(rename = "sans-serif")]
    SansSerif,
    #[serde(rename = "script")]
    Script,
    #[serde(rename = "modern")]
    Modern,
}

impl LabelFont {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serif => "serif",
            Self::SansSerif => "sans-serif",
            Self::Script => "script",
            Self::Modern => "modern",
        }
    }
}

impl FromStr for LabelFont {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "serif" => Ok(Self::Serif),
            "sans-serif" => Ok(Self::SansSerif),
            "script" => Ok(Self::Script),
            "modern" => Ok(Self::Modern),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Customization lifecycle status
///
/// Monotonic: once `ordered`, a customization never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CustomizationStatus {
    #[default]
    Draft,
    Completed,
    Ordered,
}

impl CustomizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Completed => "completed",
            Self::Ordered => "ordered",
        }
    }
}

impl FromStr for CustomizationStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "completed" => Ok(Self::Completed),
            "ordered" => Ok(Self::Ordered),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Fragrance selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragranceSelection {
    pub fragrance_type: FragranceType,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub specific_notes: Vec<String>,
}

/// Bottle selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleSelection {
    pub style: BottleStyle,
    pub color: String,
    pub size: BottleSize,
    #[serde(default)]
    pub material: BottleMaterial,
}

/// Label selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelSelection {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font: LabelFont,
    #[serde(default)]
    pub color: Option<String>,
}

impl LabelSelection {
    /// The flat label fee applies only when label text is present
    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Per-unit price decomposition
///
/// `base_price`, `bottle_upgrade`, `fragrance_upgrade` and `material_upgrade`
/// are already scaled by the size multiplier; `packaging_upgrade` and
/// `label_customization` are flat per-unit add-ons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub bottle_upgrade: f64,
    pub fragrance_upgrade: f64,
    pub material_upgrade: f64,
    pub packaging_upgrade: f64,
    pub label_customization: f64,
}

impl PriceBreakdown {
    /// Unit price is the sum of every component
    pub fn unit_price(&self) -> f64 {
        let sum = [
            self.base_price,
            self.bottle_upgrade,
            self.fragrance_upgrade,
            self.material_upgrade,
            self.packaging_upgrade,
            self.label_customization,
        ]
        .iter()
        .map(|v| Decimal::from_f64(*v).unwrap_or_default())
        .sum::<Decimal>();
        sum.to_f64().unwrap_or(0.0)
    }
}

/// A user's configured perfume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customization {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub fragrance: FragranceSelection,
    pub bottle: BottleSelection,
    #[serde(default)]
    pub label: LabelSelection,
    pub packaging: Packaging,
    pub quantity: i64,
    pub price_breakdown: PriceBreakdown,
    pub total_price: f64,
    pub status: CustomizationStatus,
    pub image: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Customization {
    /// Per-unit price derived from the stored total
    pub fn unit_price(&self) -> f64 {
        if self.quantity <= 0 {
            return 0.0;
        }
        self.total_price / self.quantity as f64
    }
}

/// The configurable part of a customization, the input the pricing
/// calculator prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizationSelection {
    pub fragrance: FragranceSelection,
    pub bottle: BottleSelection,
    #[serde(default)]
    pub label: LabelSelection,
    #[serde(default)]
    pub packaging: Packaging,
}

/// Create customization payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomizationCreate {
    pub name: String,
    #[serde(flatten)]
    pub selection: CustomizationSelection,
    pub quantity: i64,
}

/// Update customization payload; absent fields are left untouched.
/// Any change to the selection or quantity triggers a price recalculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomizationUpdate {
    pub name: Option<String>,
    pub fragrance: Option<FragranceSelection>,
    pub bottle: Option<BottleSelection>,
    pub label: Option<LabelSelection>,
    pub packaging: Option<Packaging>,
    pub quantity: Option<i64>,
    pub status: Option<CustomizationStatus>,
    pub image: Option<String>,
}

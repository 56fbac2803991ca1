//! Order Model
//!
//! An order is an immutable snapshot of a cart plus shipping, payment and
//! fulfillment tracking. After creation only the order status and the
//! payment fields move, each through a guarded state-machine transition.

use super::InvalidValue;
use super::cart::LineSource;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Order fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Processing,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Cancellation is only allowed before the order ships
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Processing | Self::Confirmed)
    }

    /// Payment transition implied by entering this fulfillment status.
    ///
    /// Delivery completes the payment (cash-on-delivery is collected at the
    /// door); every other status leaves payment alone. Kept here so the
    /// coupling is part of the state machine's table rather than scattered
    /// through handlers.
    pub fn payment_side_effect(&self) -> Option<PaymentStatus> {
        match self {
            Self::Delivered => Some(PaymentStatus::Completed),
            _ => None,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Payment channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Easypaisa,
    Jazzcash,
    BankTransfer,
    Cod,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Easypaisa => "easypaisa",
            Self::Jazzcash => "jazzcash",
            Self::BankTransfer => "bank_transfer",
            Self::Cod => "cod",
        }
    }

    /// Card methods go through the payment gateway intent flow
    pub fn is_card(&self) -> bool {
        matches!(self, Self::CreditCard | Self::DebitCard)
    }

    /// Prefix for the locally-generated reference code, for channels that
    /// confirm out of band. Card methods and cash-on-delivery have none.
    pub fn reference_prefix(&self) -> Option<&'static str> {
        match self {
            Self::Easypaisa | Self::Jazzcash => Some("MP"),
            Self::BankTransfer => Some("BT"),
            Self::CreditCard | Self::DebitCard | Self::Cod => None,
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "easypaisa" => Ok(Self::Easypaisa),
            "jazzcash" => Ok(Self::Jazzcash),
            "bank_transfer" => Ok(Self::BankTransfer),
            "cod" => Ok(Self::Cod),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Payment lifecycle status
///
/// `pending → completed` and `pending → failed`; `completed` is terminal.
/// A failed payment is retried by re-initiating, which overwrites the
/// transaction reference and moves the status back to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(InvalidValue(other.to_string())),
        }
    }
}

/// Payment tracking, owned by its order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    /// Millisecond timestamp of payment completion
    pub payment_date: Option<i64>,
}

/// Shipping destination, validated on order creation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingInfo {
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "state is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "zip code is required"))]
    pub zip_code: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
}

/// A frozen order line, same shape as a cart line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    #[serde(flatten)]
    pub source: LineSource,
    pub name: String,
    pub unit_price: f64,
    pub quantity: i64,
    pub image: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// A persisted order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,
    pub payment: PaymentInfo,
    /// Sum of line `unit_price × quantity`
    pub items_price: f64,
    /// Set once at creation, never recomputed
    pub tax_price: f64,
    /// Set once at creation, never recomputed
    pub shipping_price: f64,
    /// Always `items_price + tax_price + shipping_price`
    pub total_price: f64,
    pub status: OrderStatus,
    pub delivered_at: Option<i64>,
    pub created_at: i64,
}

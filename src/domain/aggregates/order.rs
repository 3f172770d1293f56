//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::Quantity;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::Paid, Self::Shipped, Self::Delivered, Self::Canceled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Canceled => "CANCELED",
        }
    }

    /// Statuses reachable in one step. Delivered and canceled orders are final.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pending => &[Self::Paid, Self::Canceled],
            Self::Paid => &[Self::Shipped, Self::Canceled],
            Self::Shipped => &[Self::Delivered, Self::Canceled],
            Self::Delivered | Self::Canceled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool { self.allowed_next().contains(&next) }
    pub fn is_terminal(&self) -> bool { self.allowed_next().is_empty() }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown order status '{}'", self.0) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One priced line of a persisted order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    /// Unit price captured from the catalog when the order was created.
    pub price: Decimal,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn total_of(items: &[OrderItem]) -> Decimal {
        items.iter().map(OrderItem::line_total).sum()
    }
}

/// A priced order that has not been persisted yet; the store assigns the id
/// and both timestamps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub shipping_address: String,
    pub payment_method: String,
    pub payment_id: Option<String>,
}

impl NewOrder {
    pub fn pending(user_id: impl Into<String>, items: Vec<OrderItem>, shipping_address: impl Into<String>, payment_method: impl Into<String>) -> Self {
        let total_amount = Order::total_of(&items);
        Self {
            user_id: user_id.into(), items, total_amount, status: OrderStatus::Pending,
            shipping_address: shipping_address.into(), payment_method: payment_method.into(), payment_id: None,
        }
    }

    pub fn into_order(self, id: String, now: DateTime<Utc>) -> Order {
        Order {
            id, user_id: self.user_id, items: self.items, total_amount: self.total_amount, status: self.status,
            shipping_address: self.shipping_address, payment_method: self.payment_method, payment_id: self.payment_id,
            created_at: now, updated_at: now,
        }
    }
}

/// Client-supplied changes to a stored order. Every field is optional; the
/// fields fixed at creation may be echoed back but must not differ.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderUpdate {
    pub user_id: Option<String>,
    pub items: Option<Vec<OrderItem>>,
    pub total_amount: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

impl OrderUpdate {
    /// The fields a store may write. Status, items, owner and total are never
    /// part of a patch.
    pub fn patch(&self) -> OrderPatch {
        OrderPatch {
            shipping_address: self.shipping_address.clone(),
            payment_method: self.payment_method.clone(),
            payment_id: self.payment_id.clone(),
        }
    }
}

/// Mutable order columns; `None` leaves the stored value as it is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
    pub payment_id: Option<String>,
}

impl OrderPatch {
    pub fn apply(&self, order: &mut Order) {
        if let Some(address) = &self.shipping_address { order.shipping_address = address.clone(); }
        if let Some(method) = &self.payment_method { order.payment_method = method.clone(); }
        if let Some(payment_id) = &self.payment_id { order.payment_id = Some(payment_id.clone()); }
    }
}

/// Client-supplied order before server-side pricing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub items: Vec<DraftItem>,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftItem {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: i64,
    /// Ignored: the catalog price always wins.
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl OrderDraft {
    /// Structural checks that need no collaborator. Returns the items with
    /// validated quantities, in submission order.
    pub fn validate(&self) -> Result<Vec<(String, Quantity)>, DraftError> {
        if self.user_id.trim().is_empty() { return Err(DraftError::MissingUser); }
        if self.items.is_empty() { return Err(DraftError::NoItems); }
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if item.product_id.trim().is_empty() { return Err(DraftError::MissingProduct { index }); }
                let quantity = Quantity::new(item.quantity)
                    .ok_or(DraftError::BadQuantity { index, quantity: item.quantity })?;
                Ok((item.product_id.clone(), quantity))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError { MissingUser, NoItems, MissingProduct { index: usize }, BadQuantity { index: usize, quantity: i64 } }
impl std::error::Error for DraftError {}
impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUser => write!(f, "userId is required"),
            Self::NoItems => write!(f, "order must contain at least one item"),
            Self::MissingProduct { index } => write!(f, "item {index} has no productId"),
            Self::BadQuantity { index, quantity } => write!(f, "item {index} has quantity {quantity}, expected at least 1"),
        }
    }
}

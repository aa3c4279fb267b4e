//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// An order row, optionally with its embedded items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub shipping_address: serde_json::Value,
    #[serde(default)]
    pub contact_info: serde_json::Value,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded `items:order_items(...)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
}

/// An order line. The price is frozen at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub quantity: i32,
    pub price_at_purchase: Price,
    #[serde(default)]
    pub product: Option<OrderProduct>,
}

/// Product fields embedded in an order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// What the shopper submits at checkout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutDetails {
    #[serde(default)]
    pub shipping_address: serde_json::Value,
    #[serde(default)]
    pub contact_info: serde_json::Value,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Insert payload for an order.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder<'a> {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Price,
    pub shipping_address: &'a serde_json::Value,
    pub contact_info: &'a serde_json::Value,
    pub notes: &'a str,
}

/// Insert payload for an order line.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub price_at_purchase: Price,
}

//! Cart rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::{CartItemId, CartOwner, Price, ProductId, UserId};

/// A cart line with its embedded product summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded `product:products(id,name,slug,price,image_url,stock_quantity)`.
    #[serde(default)]
    pub product: Option<CartProduct>,
}

impl CartItem {
    /// Unit price times quantity; zero if the product was not embedded.
    #[must_use]
    pub fn line_total(&self) -> Price {
        let quantity = u32::try_from(self.quantity).unwrap_or(0);
        self.product
            .as_ref()
            .map_or(Price::ZERO, |product| product.price.line_total(quantity))
    }
}

/// Product fields embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock_quantity: i32,
}

/// Insert payload for a new cart line.
///
/// Built from a [`CartOwner`], so exactly one of `user_id` and `session_id`
/// is set.
#[derive(Debug, Clone, Serialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub user_id: Option<UserId>,
    pub session_id: Option<String>,
}

impl NewCartItem {
    #[must_use]
    pub fn new(owner: &CartOwner, product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
            user_id: owner.user_id(),
            session_id: owner.session_id().map(|s| s.as_str().to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use greenbasket_core::GuestSessionId;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_new_cart_item_for_guest() {
        let owner = CartOwner::Guest(GuestSessionId::new("s1".to_string()));
        let product_id = ProductId::new(Uuid::new_v4());
        let row = serde_json::to_value(NewCartItem::new(&owner, product_id, 2)).unwrap();
        assert_eq!(row["session_id"], json!("s1"));
        assert_eq!(row["user_id"], json!(null));
        assert_eq!(row["quantity"], json!(2));
    }

    #[test]
    fn test_new_cart_item_for_user() {
        let user = UserId::new(Uuid::new_v4());
        let owner = CartOwner::User(user);
        let row = NewCartItem::new(&owner, ProductId::new(Uuid::new_v4()), 1);
        assert_eq!(row.user_id, Some(user));
        assert!(row.session_id.is_none());
    }

    #[test]
    fn test_line_total() {
        let item: CartItem = serde_json::from_value(json!({
            "id": "a3bb189e-8bf9-3888-9912-ace4e6543002",
            "product_id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "quantity": 3,
            "user_id": null,
            "session_id": "s1",
            "product": {
                "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
                "name": "Moong",
                "slug": "moong",
                "price": "12.00",
                "image_url": null,
                "stock_quantity": 40
            }
        }))
        .unwrap();
        assert_eq!(item.line_total().to_string(), "$36.00");
    }
}

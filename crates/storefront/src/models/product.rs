//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::{CategoryId, Price, ProductId, ProductImageId};

/// A product row, with whatever embedded selections were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded `category:categories(id,name,slug)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    /// Embedded `images:product_images(id,image_url,display_order)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ProductImage>>,
}

/// Category fields embedded in a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// Additional product photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub image_url: String,
    #[serde(default)]
    pub display_order: i32,
}

/// Fields for creating or editing a product from the back-office.
///
/// Unset fields are left out of the request, so the same type serves for
/// inserts (platform defaults apply) and partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_product_with_embedded_category() {
        let product: Product = serde_json::from_value(json!({
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "name": "Moong",
            "slug": "moong",
            "description": null,
            "price": 12.00,
            "stock_quantity": 40,
            "is_active": true,
            "category_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "image_url": null,
            "created_at": "2024-05-01T10:00:00+00:00",
            "updated_at": "2024-05-01T10:00:00+00:00",
            "category": {
                "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                "name": "Pulses",
                "slug": "pulses"
            }
        }))
        .unwrap();

        assert_eq!(product.price, Price::from_cents(1200));
        assert_eq!(product.category.unwrap().slug, "pulses");
        assert!(product.images.is_none());
    }

    #[test]
    fn test_product_input_skips_unset_fields() {
        let input = ProductInput {
            stock_quantity: Some(5),
            ..ProductInput::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({ "stock_quantity": 5 })
        );
    }
}

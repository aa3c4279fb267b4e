//! Domain models for storefront.
//!
//! Row shapes as returned by the platform (including embedded selections),
//! and the payloads written back to it. The platform owns validation; these
//! types only describe the wire format.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod session;
pub mod user_role;

pub use cart::{CartItem, CartProduct, NewCartItem};
pub use category::{Category, CategoryInput};
pub use order::{CheckoutDetails, Order, OrderItem, OrderProduct};
pub use product::{CategorySummary, Product, ProductImage, ProductInput};
pub use session::CurrentUser;
pub use user_role::UserRole;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An update payload with `updated_at` stamped alongside its fields.
#[derive(Debug, Serialize)]
pub struct Stamped<'a, T: Serialize> {
    #[serde(flatten)]
    pub fields: &'a T,
    pub updated_at: DateTime<Utc>,
}

impl<'a, T: Serialize> Stamped<'a, T> {
    /// Stamp `fields` with the current time.
    #[must_use]
    pub fn now(fields: &'a T) -> Self {
        Self {
            fields,
            updated_at: Utc::now(),
        }
    }
}

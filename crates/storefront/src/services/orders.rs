//! Checkout and order history.

use thiserror::Error;
use tracing::instrument;

use greenbasket_core::{OrderId, OrderStatus, Price, ProductId};

use crate::models::order::{NewOrder, NewOrderItem};
use crate::models::{CheckoutDetails, CurrentUser, Order};
use crate::platform::{self, PlatformClient, PlatformError};
use crate::services::cart::CartService;

const HISTORY_SELECT: &str = "*,items:order_items(*,product:products(id,name,slug,image_url))";
const DETAIL_SELECT: &str =
    "*,items:order_items(*,product:products(id,name,slug,image_url,description))";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The shopper's cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A cart line points at a product that is gone or hidden.
    #[error("Product no longer available")]
    ProductUnavailable(ProductId),

    /// A platform call failed.
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Orders of one signed-in shopper.
pub struct OrderService<'a> {
    client: &'a PlatformClient,
    access_token: &'a str,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(client: &'a PlatformClient, access_token: &'a str) -> Self {
        Self {
            client,
            access_token,
        }
    }

    /// Turn the user's cart into a pending order.
    ///
    /// Totals the cart at current prices, inserts the order, inserts one order
    /// line per cart line with the price frozen, then empties the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy,
    /// `CheckoutError::ProductUnavailable` if a line's product can no longer
    /// be read, or `CheckoutError::Platform` if any step fails. Steps are not rolled back:
    /// a failure after the order insert leaves the order in place.
    #[instrument(skip(self, user, details), fields(user_id = %user.id))]
    pub async fn create_order(
        &self,
        user: &CurrentUser,
        details: &CheckoutDetails,
    ) -> Result<Order, CheckoutError> {
        let cart = CartService::new(self.client, Some(self.access_token));
        let owner = user.cart_owner();

        let items = cart.items(&owner).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let priced = items
            .iter()
            .map(|item| match &item.product {
                Some(product) => Ok((item, product.price)),
                None => {
                    tracing::warn!(product_id = %item.product_id, "Cart line without readable product");
                    Err(CheckoutError::ProductUnavailable(item.product_id))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_amount: Price = priced.iter().map(|(item, _)| item.line_total()).sum();
        let order = NewOrder {
            user_id: user.id,
            status: OrderStatus::Pending,
            total_amount,
            shipping_address: &details.shipping_address,
            contact_info: &details.contact_info,
            notes: details.notes.as_deref().unwrap_or_default(),
        };

        let created: Order = platform::exactly_one(
            self.client
                .from("orders")
                .select("*")
                .authorized(Some(self.access_token))
                .insert(&[order])
                .await?,
        )?;

        let lines: Vec<NewOrderItem> = priced
            .iter()
            .map(|(item, price)| NewOrderItem {
                order_id: created.id,
                product_id: item.product_id,
                quantity: item.quantity,
                price_at_purchase: *price,
            })
            .collect();

        self.client
            .from("order_items")
            .authorized(Some(self.access_token))
            .insert_silent(&lines)
            .await?;

        cart.clear(&owner).await?;

        tracing::info!(order_id = %created.id, total = %total_amount, "Order placed");
        Ok(created)
    }

    /// The user's orders with their lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn list_for_user(&self, user: &CurrentUser) -> Result<Vec<Order>, PlatformError> {
        self.client
            .from("orders")
            .select(HISTORY_SELECT)
            .eq("user_id", user.id)
            .order("created_at", platform::Order::Desc)
            .authorized(Some(self.access_token))
            .fetch()
            .await
    }

    /// One of the user's orders, or `None` if it does not exist or belongs to
    /// someone else.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_for_user(
        &self,
        user: &CurrentUser,
        order_id: OrderId,
    ) -> Result<Option<Order>, PlatformError> {
        self.client
            .from("orders")
            .select(DETAIL_SELECT)
            .eq("id", order_id)
            .eq("user_id", user.id)
            .authorized(Some(self.access_token))
            .maybe_single()
            .await
    }
}

//! Cart rows for signed-in users and guests.
//!
//! A guest's rows carry their session id and a null `user_id`; a user's rows
//! carry the `user_id`. When a guest signs in, [`CartService::merge_guest_cart`]
//! re-owns all of their rows in a single statement.

use serde::de::IgnoredAny;
use serde_json::json;
use tracing::instrument;

use greenbasket_core::{CartItemId, CartOwner, GuestSessionId, ProductId, UserId};

use crate::models::{CartItem, NewCartItem, Stamped};
use crate::platform::{PlatformClient, PlatformError, TableQuery, exactly_one};

const ITEM_SELECT: &str = "*,product:products(id,name,slug,price,image_url,stock_quantity)";

/// Result of a guest cart merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The guest had no rows; nothing changed.
    NothingToMerge,
    /// This many rows now belong to the user.
    Merged(usize),
}

/// Cart operations, run as the shopper holding `access_token` (or anonymously).
pub struct CartService<'a> {
    client: &'a PlatformClient,
    access_token: Option<&'a str>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(client: &'a PlatformClient, access_token: Option<&'a str>) -> Self {
        Self {
            client,
            access_token,
        }
    }

    fn table(&self) -> TableQuery<'a> {
        self.client.from("cart_items").authorized(self.access_token)
    }

    /// All lines owned by `owner`, with product summaries.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn items(&self, owner: &CartOwner) -> Result<Vec<CartItem>, PlatformError> {
        owned_by(self.table().select(ITEM_SELECT), owner)
            .fetch()
            .await
    }

    /// Add `quantity` of a product. An existing line for the same product is
    /// bumped instead of duplicated.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn add(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<CartItem>, PlatformError> {
        let existing: Vec<CartItem> = owned_by(self.table().select("*"), owner)
            .eq("product_id", product_id)
            .fetch()
            .await?;

        if let Some(line) = existing.first() {
            return self
                .update_quantity(line.id, line.quantity.saturating_add(quantity))
                .await;
        }

        let rows: Vec<CartItem> = self
            .table()
            .select(ITEM_SELECT)
            .insert(&[NewCartItem::new(owner, product_id, quantity)])
            .await?;
        exactly_one(rows).map(Some)
    }

    /// Set a line's quantity. A quantity of zero or less removes the line and
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails or the line does not exist.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<Option<CartItem>, PlatformError> {
        if quantity <= 0 {
            self.remove(item_id).await?;
            return Ok(None);
        }

        let patch = json!({ "quantity": quantity });
        let rows: Vec<CartItem> = self
            .table()
            .select(ITEM_SELECT)
            .eq("id", item_id)
            .update(&Stamped::now(&patch))
            .await?;
        exactly_one(rows).map(Some)
    }

    /// Delete one line.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, item_id: CartItemId) -> Result<(), PlatformError> {
        self.table().eq("id", item_id).delete().await
    }

    /// Delete every line owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn clear(&self, owner: &CartOwner) -> Result<(), PlatformError> {
        owned_by(self.table(), owner).delete().await
    }

    /// Hand every row of a guest cart to `user` in one update.
    ///
    /// The update is a single statement, so either all of the guest's rows
    /// move or none do. Lines for a product the user already had are kept as
    /// separate lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails; no rows moved in that case.
    #[instrument(skip(self), fields(user_id = %user, guest = %guest))]
    pub async fn merge_guest_cart(
        &self,
        user: UserId,
        guest: &GuestSessionId,
    ) -> Result<MergeOutcome, PlatformError> {
        let moved: Vec<IgnoredAny> = self
            .table()
            .select("id")
            .eq("session_id", guest)
            .is_null("user_id")
            .update(&json!({ "user_id": user, "session_id": null }))
            .await?;

        if moved.is_empty() {
            return Ok(MergeOutcome::NothingToMerge);
        }

        tracing::info!(rows = moved.len(), "Merged guest cart");
        Ok(MergeOutcome::Merged(moved.len()))
    }
}

fn owned_by<'a>(query: TableQuery<'a>, owner: &CartOwner) -> TableQuery<'a> {
    match owner {
        CartOwner::User(user_id) => query.eq("user_id", user_id),
        CartOwner::Guest(session) => query.eq("session_id", session).is_null("user_id"),
    }
}

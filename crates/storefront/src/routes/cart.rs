//! Cart route handlers.
//!
//! Guests and signed-in shoppers share these routes; the cart owner comes
//! from the visitor session. Every mutation reloads the cart and answers the
//! folded cart state, which is kept in the session so a failed reload still
//! shows the last known items.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use greenbasket_core::{CartItemId, CartOwner, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, Shopper};
use crate::services::CartService;
use crate::state::AppState;
use crate::store::{CartAction, CartState};

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Quantity change request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItem {
    pub quantity: i32,
}

/// The visitor's cart, resolved once per request.
struct VisitorCart<'a> {
    service: CartService<'a>,
    owner: CartOwner,
}

impl<'a> VisitorCart<'a> {
    async fn resolve(
        state: &'a AppState,
        shopper: &Shopper,
        auth: Option<&'a str>,
    ) -> Result<Self> {
        Ok(Self {
            service: CartService::new(state.platform(), auth),
            owner: shopper.cart_owner().await?,
        })
    }

    /// Reload the rows and fold the outcome into the session's cart state.
    async fn reload(&self, shopper: &Shopper) -> Result<CartState> {
        let cart = shopper.cart_state().await?.apply(CartAction::LoadStarted);
        let cart = match self.service.items(&self.owner).await {
            Ok(items) => cart.apply(CartAction::Loaded(items)),
            Err(e) => {
                let err = AppError::from(e);
                tracing::warn!(error = %err, owner = %self.owner, "Failed to load cart");
                cart.apply(CartAction::LoadFailed(err.client_message()))
            }
        };
        shopper.save_cart_state(&cart).await?;
        Ok(cart)
    }
}

/// Cart summary.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    shopper: Shopper,
) -> Result<Json<CartState>> {
    let token = auth.as_ref().map(|a| a.access_token.as_str());
    let cart = VisitorCart::resolve(&state, &shopper, token).await?;
    Ok(Json(cart.reload(&shopper).await?))
}

/// Add a product, incrementing the line if it is already in the cart.
#[instrument(skip_all, fields(product_id = %body.product_id, quantity = body.quantity))]
pub async fn add(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    shopper: Shopper,
    Json(body): Json<AddItem>,
) -> Result<Json<CartState>> {
    if body.quantity < 1 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let token = auth.as_ref().map(|a| a.access_token.as_str());
    let cart = VisitorCart::resolve(&state, &shopper, token).await?;
    cart.service
        .add(&cart.owner, body.product_id, body.quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &body.product_id.to_string())]),
    );
    Ok(Json(cart.reload(&shopper).await?))
}

/// Set a line's quantity. Zero or less removes the line.
#[instrument(skip_all, fields(item_id = %id, quantity = body.quantity))]
pub async fn update(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    shopper: Shopper,
    Path(id): Path<CartItemId>,
    Json(body): Json<UpdateItem>,
) -> Result<Json<CartState>> {
    let token = auth.as_ref().map(|a| a.access_token.as_str());
    let cart = VisitorCart::resolve(&state, &shopper, token).await?;
    cart.service.update_quantity(id, body.quantity).await?;
    Ok(Json(cart.reload(&shopper).await?))
}

/// Remove a line.
#[instrument(skip_all, fields(item_id = %id))]
pub async fn remove(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    shopper: Shopper,
    Path(id): Path<CartItemId>,
) -> Result<Json<CartState>> {
    let token = auth.as_ref().map(|a| a.access_token.as_str());
    let cart = VisitorCart::resolve(&state, &shopper, token).await?;
    cart.service.remove(id).await?;
    Ok(Json(cart.reload(&shopper).await?))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    shopper: Shopper,
) -> Result<Json<CartState>> {
    let token = auth.as_ref().map(|a| a.access_token.as_str());
    let cart = VisitorCart::resolve(&state, &shopper, token).await?;
    cart.service.clear(&cart.owner).await?;

    let cleared = shopper.cart_state().await?.apply(CartAction::Cleared);
    shopper.save_cart_state(&cleared).await?;
    Ok(Json(cleared))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_quantity_defaults_to_one() {
        let body: AddItem = serde_json::from_str(
            r#"{"product_id":"7c4b7a0e-4b7e-4d55-9d2b-0d3b1f1e8a11"}"#,
        )
        .unwrap();
        assert_eq!(body.quantity, 1);
    }

    #[test]
    fn test_add_item_rejects_bad_product_id() {
        let body = serde_json::from_str::<AddItem>(r#"{"product_id":"abc","quantity":2}"#);
        assert!(body.is_err());
    }
}

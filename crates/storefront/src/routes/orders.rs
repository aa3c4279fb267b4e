//! Checkout and order history handlers (requires auth).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use greenbasket_core::OrderId;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAuth, Shopper};
use crate::models::{CheckoutDetails, Order};
use crate::services::OrderService;
use crate::state::AppState;
use crate::store::CartAction;

/// Place an order from the signed-in shopper's cart.
///
/// Answers 201 with the new order; the cart state is cleared.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    shopper: Shopper,
    Json(details): Json<CheckoutDetails>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.platform(), &auth.access_token)
        .create_order(&auth.user, &details)
        .await?;

    let cleared = shopper.cart_state().await?.apply(CartAction::Cleared);
    shopper.save_cart_state(&cleared).await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );
    Ok((StatusCode::CREATED, Json(order)))
}

/// Order history, newest first.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.platform(), &auth.access_token)
        .list_for_user(&auth.user)
        .await?;
    Ok(Json(orders))
}

/// One order with its lines.
#[instrument(skip_all, fields(user_id = %auth.user.id, order_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderService::new(state.platform(), &auth.access_token)
        .get_for_user(&auth.user, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order".to_string()))
}

//! Back-office route handlers (requires admin).
//!
//! Every handler runs as the admin's own access token, so the platform's row
//! security applies on top of the role check in [`RequireAdmin`].

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use greenbasket_core::{CategoryId, OrderId, OrderStatus, ProductId, Role, UserId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryInput, Order, Product, ProductInput, UserRole};
use crate::services::AdminService;
use crate::services::admin::{DashboardStats, LOW_STOCK_THRESHOLD, RECENT_ORDERS_LIMIT};
use crate::state::AppState;

/// Query parameters for the recent orders list.
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
}

const fn default_recent_limit() -> usize {
    RECENT_ORDERS_LIMIT
}

/// Query parameters for the low-stock list.
#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    #[serde(default = "default_threshold")]
    pub threshold: i32,
}

const fn default_threshold() -> i32 {
    LOW_STOCK_THRESHOLD
}

/// Order status change request body.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// Role change request body.
#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

// =============================================================================
// Dashboard / Orders
// =============================================================================

/// Dashboard counts and revenue.
#[instrument(skip_all, fields(admin_id = %auth.user.id))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    let stats = AdminService::new(state.platform(), Some(&auth.access_token))
        .dashboard_stats()
        .await?;
    Ok(Json(stats))
}

/// Every order, newest first.
#[instrument(skip_all, fields(admin_id = %auth.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = AdminService::new(state.platform(), Some(&auth.access_token))
        .all_orders()
        .await?;
    Ok(Json(orders))
}

/// The latest orders.
#[instrument(skip_all, fields(admin_id = %auth.user.id, limit = query.limit))]
pub async fn recent_orders(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Order>>> {
    if query.limit == 0 {
        return Err(AppError::BadRequest("Limit must be at least 1".to_string()));
    }
    let orders = AdminService::new(state.platform(), Some(&auth.access_token))
        .recent_orders(query.limit)
        .await?;
    Ok(Json(orders))
}

/// Move an order to a new status.
#[instrument(skip_all, fields(admin_id = %auth.user.id, order_id = %id, status = %body.status))]
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = AdminService::new(state.platform(), Some(&auth.access_token))
        .update_order_status(id, body.status)
        .await?;
    tracing::info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order))
}

// =============================================================================
// Products
// =============================================================================

/// Create a product.
#[instrument(skip_all, fields(admin_id = %auth.user.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = AdminService::new(state.platform(), Some(&auth.access_token))
        .create_product(&input)
        .await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Apply the fields present in the body to a product.
#[instrument(skip_all, fields(admin_id = %auth.user.id, product_id = %id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    let product = AdminService::new(state.platform(), Some(&auth.access_token))
        .update_product(id, &input)
        .await?;
    Ok(Json(product))
}

/// Delete a product.
#[instrument(skip_all, fields(admin_id = %auth.user.id, product_id = %id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    AdminService::new(state.platform(), Some(&auth.access_token))
        .delete_product(id)
        .await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Products at or below the stock threshold.
#[instrument(skip_all, fields(admin_id = %auth.user.id, threshold = query.threshold))]
pub async fn low_stock(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Query(query): Query<LowStockQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = AdminService::new(state.platform(), Some(&auth.access_token))
        .low_stock_products(query.threshold)
        .await?;
    Ok(Json(products))
}

// =============================================================================
// Categories
// =============================================================================

/// Create a category.
#[instrument(skip_all, fields(admin_id = %auth.user.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = AdminService::new(state.platform(), Some(&auth.access_token))
        .create_category(&input)
        .await?;
    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Apply the fields present in the body to a category.
#[instrument(skip_all, fields(admin_id = %auth.user.id, category_id = %id))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Category>> {
    let category = AdminService::new(state.platform(), Some(&auth.access_token))
        .update_category(id, &input)
        .await?;
    Ok(Json(category))
}

/// Delete a category.
#[instrument(skip_all, fields(admin_id = %auth.user.id, category_id = %id))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    AdminService::new(state.platform(), Some(&auth.access_token))
        .delete_category(id)
        .await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Users
// =============================================================================

/// All role assignments.
#[instrument(skip_all, fields(admin_id = %auth.user.id))]
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
) -> Result<Json<Vec<UserRole>>> {
    let roles = AdminService::new(state.platform(), Some(&auth.access_token))
        .list_user_roles()
        .await?;
    Ok(Json(roles))
}

/// Change a user's role.
#[instrument(skip_all, fields(admin_id = %auth.user.id, user_id = %user_id, role = %body.role))]
pub async fn update_user_role(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Path(user_id): Path<UserId>,
    Json(body): Json<RoleUpdate>,
) -> Result<Json<UserRole>> {
    let role = AdminService::new(state.platform(), Some(&auth.access_token))
        .update_user_role(user_id, &body.role)
        .await?;
    tracing::info!(user_id = %user_id, role = %role.role, "User role updated");
    Ok(Json(role))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_query_default_limit() {
        let query: RecentQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, RECENT_ORDERS_LIMIT);
    }

    #[test]
    fn test_low_stock_query_default_threshold() {
        let query: LowStockQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.threshold, LOW_STOCK_THRESHOLD);
    }

    #[test]
    fn test_status_update_parses_lowercase() {
        let body: StatusUpdate = serde_json::from_str(r#"{"status":"shipped"}"#).unwrap();
        assert_eq!(body.status, OrderStatus::Shipped);
    }
}

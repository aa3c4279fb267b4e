//! HTTP route handlers for the storefront.
//!
//! Every route answers JSON. Failures carry `{"error": message}`.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//!
//! # Catalog
//! GET  /api/products?search=&category= - Active products (optionally filtered)
//! GET  /api/products/{slug}           - Product detail with images
//! GET  /api/categories                - Category listing
//! GET  /api/categories/{slug}         - Category with its products
//!
//! # Cart (guest or signed in)
//! GET    /api/cart                    - Cart summary
//! DELETE /api/cart                    - Empty the cart
//! POST   /api/cart/items              - Add a product (increments if present)
//! PATCH  /api/cart/items/{id}         - Set quantity (0 removes the line)
//! DELETE /api/cart/items/{id}         - Remove a line
//!
//! # Orders (requires auth)
//! POST /api/checkout                  - Turn the cart into an order
//! GET  /api/orders                    - Order history
//! GET  /api/orders/{id}               - Order detail
//!
//! # Auth
//! POST /api/auth/sign-up              - Register
//! POST /api/auth/sign-in              - Sign in (merges the guest cart)
//! POST /api/auth/sign-out             - Sign out
//! POST /api/auth/password/reset       - Email a reset link
//! GET  /api/auth/session              - Current user (retries a pending merge)
//! PUT  /api/auth/password             - Change password (requires auth)
//! PUT  /api/auth/profile              - Update name and phone (requires auth)
//!
//! # Back-office (requires admin)
//! GET    /api/admin/stats                     - Dashboard counts and revenue
//! GET    /api/admin/orders                    - All orders
//! GET    /api/admin/orders/recent?limit=      - Latest orders
//! PATCH  /api/admin/orders/{id}/status        - Move an order along
//! GET    /api/admin/products/low-stock?threshold= - Products to restock
//! POST   /api/admin/products                  - Create product
//! PATCH  /api/admin/products/{id}             - Update product
//! DELETE /api/admin/products/{id}             - Delete product
//! POST   /api/admin/categories                - Create category
//! PATCH  /api/admin/categories/{id}           - Update category
//! DELETE /api/admin/categories/{id}           - Delete category
//! GET    /api/admin/users                     - Role assignments
//! PATCH  /api/admin/users/{user_id}/role      - Change a user's role
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/categories", get(categories::index))
        .route("/categories/{slug}", get(categories::show))
}

/// Create the cart and order routes router.
pub fn shopping_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).delete(cart::clear))
        .route("/cart/items", post(cart::add))
        .route(
            "/cart/items/{id}",
            patch(cart::update).delete(cart::remove),
        )
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/password/reset", post(auth::reset_password))
        .route("/password", put(auth::update_password))
        .route("/session", get(auth::session))
        .route("/profile", put(auth::update_profile))
}

/// Create the back-office routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/orders", get(admin::orders))
        .route("/orders/recent", get(admin::recent_orders))
        .route("/orders/{id}/status", patch(admin::update_order_status))
        .route("/products", post(admin::create_product))
        .route("/products/low-stock", get(admin::low_stock))
        .route(
            "/products/{id}",
            patch(admin::update_product).delete(admin::delete_product),
        )
        .route("/categories", post(admin::create_category))
        .route(
            "/categories/{id}",
            patch(admin::update_category).delete(admin::delete_category),
        )
        .route("/users", get(admin::users))
        .route("/users/{user_id}/role", patch(admin::update_user_role))
}

/// Create the main router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .merge(catalog_routes())
                .merge(shopping_routes())
                .nest("/auth", auth_routes())
                .nest("/admin", admin_routes()),
        )
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the platform.
async fn health() -> &'static str {
    "ok"
}

//! Integration tests for the back-office routes.

use greenbasket_integration_tests::{PASSWORD, TestContext};
use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn test_admin_routes_reject_anonymous_visitors() {
    let ctx = TestContext::start().await;
    let resp = ctx
        .visitor()
        .get(ctx.url("/api/admin/stats"))
        .send()
        .await
        .expect("Failed to get stats");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_customers() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("ann@example.com", PASSWORD, "customer");
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "ann@example.com").await;

    let resp = visitor
        .get(ctx.url("/api/admin/stats"))
        .send()
        .await
        .expect("Failed to get stats");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn test_dashboard_stats() {
    let ctx = TestContext::start().await;
    let admin = ctx.platform.add_user("root@example.com", PASSWORD, "admin");
    let produce = ctx.seed_category("Produce", "produce");
    ctx.seed_product("Honeycrisp Apples", "12.00", 40, Some(produce));
    ctx.seed_product("Bananas", "3.50", 80, Some(produce));
    ctx.platform.seed(
        "orders",
        [
            json!({ "id": Uuid::new_v4(), "user_id": admin, "status": "pending", "total_amount": "43.00" }),
            json!({ "id": Uuid::new_v4(), "user_id": admin, "status": "delivered", "total_amount": "7.00" }),
        ],
    );
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "root@example.com").await;

    let resp = visitor
        .get(ctx.url("/api/admin/stats"))
        .send()
        .await
        .expect("Failed to get stats");
    assert_eq!(resp.status(), StatusCode::OK);

    let stats: Value = resp.json().await.expect("stats body");
    assert_eq!(stats["total_products"], 2);
    assert_eq!(stats["total_orders"], 2);
    assert_eq!(stats["total_categories"], 1);
    assert_eq!(stats["total_revenue"], "50.00");
}

#[tokio::test]
async fn test_update_order_status() {
    let ctx = TestContext::start().await;
    let admin = ctx.platform.add_user("root@example.com", PASSWORD, "admin");
    let order = Uuid::new_v4();
    ctx.platform.seed(
        "orders",
        [json!({ "id": order, "user_id": admin, "status": "pending", "total_amount": "12.00" })],
    );
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "root@example.com").await;

    let resp = visitor
        .patch(ctx.url(&format!("/api/admin/orders/{order}/status")))
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .expect("Failed to update status");
    assert_eq!(resp.status(), StatusCode::OK);

    let rows = ctx.platform.rows("orders");
    assert_eq!(rows[0]["status"], "shipped");
}

#[tokio::test]
async fn test_low_stock_products() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("root@example.com", PASSWORD, "admin");
    ctx.seed_product("Honeycrisp Apples", "12.00", 4, None);
    ctx.seed_product("Bananas", "3.50", 80, None);
    ctx.seed_product("Kale", "2.25", 1, None);
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "root@example.com").await;

    let products: Value = visitor
        .get(ctx.url("/api/admin/products/low-stock?threshold=5"))
        .send()
        .await
        .expect("Failed to get low stock")
        .json()
        .await
        .expect("products body");

    let names: Vec<&str> = products
        .as_array()
        .expect("product list")
        .iter()
        .filter_map(|product| product["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Kale", "Honeycrisp Apples"]);
}

#[tokio::test]
async fn test_grant_admin_role() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("root@example.com", PASSWORD, "admin");
    let ann = ctx.platform.add_user("ann@example.com", PASSWORD, "customer");
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "root@example.com").await;

    let resp = visitor
        .patch(ctx.url(&format!("/api/admin/users/{ann}/role")))
        .json(&json!({ "role": "admin" }))
        .send()
        .await
        .expect("Failed to update role");
    assert_eq!(resp.status(), StatusCode::OK);

    // Ann can now reach the back-office.
    let ann_visitor = ctx.visitor();
    ctx.sign_in(&ann_visitor, "ann@example.com").await;
    let resp = ann_visitor
        .get(ctx.url("/api/admin/users"))
        .send()
        .await
        .expect("Failed to list users");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_product_create_and_delete() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("root@example.com", PASSWORD, "admin");
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "root@example.com").await;

    let resp = visitor
        .post(ctx.url("/api/admin/products"))
        .json(&json!({
            "name": "Sourdough Loaf",
            "slug": "sourdough-loaf",
            "price": "6.50",
            "stock_quantity": 12,
            "is_active": true
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.expect("product body");
    let id = product["id"].as_str().expect("product id").to_string();

    let resp = visitor
        .delete(ctx.url(&format!("/api/admin/products/{id}")))
        .send()
        .await
        .expect("Failed to delete product");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(ctx.platform.rows("products").is_empty());
}

//! Integration tests for accounts and catalog browsing.

use greenbasket_integration_tests::{PASSWORD, TestContext};
use reqwest::StatusCode;
use serde_json::{Value, json};

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_wrong_password_message_is_verbatim() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("ann@example.com", PASSWORD, "customer");

    let resp = ctx
        .visitor()
        .post(ctx.url("/api/auth/sign-in"))
        .json(&json!({ "email": "ann@example.com", "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to sign in");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["error"], "Invalid login credentials");
}

#[tokio::test]
async fn test_session_follows_sign_in_and_sign_out() {
    let ctx = TestContext::start().await;
    let user = ctx.platform.add_user("ann@example.com", PASSWORD, "customer");
    let visitor = ctx.visitor();

    let session: Value = visitor
        .get(ctx.url("/api/auth/session"))
        .send()
        .await
        .expect("Failed to get session")
        .json()
        .await
        .expect("session body");
    assert!(session["user"].is_null());

    ctx.sign_in(&visitor, "ann@example.com").await;
    let session: Value = visitor
        .get(ctx.url("/api/auth/session"))
        .send()
        .await
        .expect("Failed to get session")
        .json()
        .await
        .expect("session body");
    assert_eq!(session["user"]["id"], user.to_string());

    visitor
        .post(ctx.url("/api/auth/sign-out"))
        .send()
        .await
        .expect("Failed to sign out");
    let session: Value = visitor
        .get(ctx.url("/api/auth/session"))
        .send()
        .await
        .expect("Failed to get session")
        .json()
        .await
        .expect("session body");
    assert!(session["user"].is_null());
}

#[tokio::test]
async fn test_sign_up_validates_before_calling_platform() {
    let ctx = TestContext::start().await;
    let visitor = ctx.visitor();

    let resp = visitor
        .post(ctx.url("/api/auth/sign-up"))
        .json(&json!({
            "email": "new@example.com",
            "password": "secret1",
            "confirm_password": "secret2"
        }))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = visitor
        .post(ctx.url("/api/auth/sign-up"))
        .json(&json!({ "email": "new@example.com", "password": "abc" }))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["error"], "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_sign_up_signs_in_and_keeps_name() {
    let ctx = TestContext::start().await;
    let visitor = ctx.visitor();

    let resp = visitor
        .post(ctx.url("/api/auth/sign-up"))
        .json(&json!({
            "email": "new@example.com",
            "password": "secret1",
            "confirm_password": "secret1",
            "name": "  Nia Green "
        }))
        .send()
        .await
        .expect("Failed to sign up");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let result: Value = resp.json().await.expect("sign-up body");
    assert_eq!(result["confirmation_required"], false);
    assert_eq!(result["user"]["metadata"]["name"], "Nia Green");

    let session: Value = visitor
        .get(ctx.url("/api/auth/session"))
        .send()
        .await
        .expect("Failed to get session")
        .json()
        .await
        .expect("session body");
    assert_eq!(session["user"]["email"], "new@example.com");
}

#[tokio::test]
async fn test_update_profile() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("ann@example.com", PASSWORD, "customer");
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "ann@example.com").await;

    let user: Value = visitor
        .put(ctx.url("/api/auth/profile"))
        .json(&json!({ "name": "Ann Smith", "phone": "555-0100" }))
        .send()
        .await
        .expect("Failed to update profile")
        .json()
        .await
        .expect("user body");

    assert_eq!(user["metadata"]["name"], "Ann Smith");
    assert_eq!(user["metadata"]["phone"], "555-0100");
}

#[tokio::test]
async fn test_unexpired_access_token_is_used_without_refresh() {
    let ctx = TestContext::start().await;
    ctx.platform.add_user("ann@example.com", PASSWORD, "customer");
    let visitor = ctx.visitor();
    ctx.sign_in(&visitor, "ann@example.com").await;

    // An unexpired access token is not re-checked with the platform.
    ctx.platform.revoke_all_tokens();
    let resp = visitor
        .get(ctx.url("/api/orders"))
        .send()
        .await
        .expect("Failed to list orders");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_product_listing_and_search() {
    let ctx = TestContext::start().await;
    ctx.seed_product("Honeycrisp Apples", "12.00", 40, None);
    ctx.seed_product("Bananas", "3.50", 80, None);
    let visitor = ctx.visitor();

    let listing: Value = visitor
        .get(ctx.url("/api/products"))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("listing body");
    assert_eq!(listing["products"].as_array().expect("products").len(), 2);
    assert_eq!(listing["loading"], false);
    assert!(listing["error"].is_null());

    let listing: Value = visitor
        .get(ctx.url("/api/products?search=APPLE"))
        .send()
        .await
        .expect("Failed to search products")
        .json()
        .await
        .expect("listing body");
    let products = listing["products"].as_array().expect("products");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Honeycrisp Apples");
}

#[tokio::test]
async fn test_product_detail_and_missing_product() {
    let ctx = TestContext::start().await;
    ctx.seed_product("Honeycrisp Apples", "12.00", 40, None);
    let visitor = ctx.visitor();

    let resp = visitor
        .get(ctx.url("/api/products/honeycrisp-apples"))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::OK);
    let product: Value = resp.json().await.expect("product body");
    assert_eq!(product["price"], "12.00");

    let resp = visitor
        .get(ctx.url("/api/products/dragon-fruit"))
        .send()
        .await
        .expect("Failed to get product");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("error body");
    assert_eq!(body["error"], "Product not found");
}

#[tokio::test]
async fn test_category_page_lists_its_products() {
    let ctx = TestContext::start().await;
    let produce = ctx.seed_category("Produce", "produce");
    let bakery = ctx.seed_category("Bakery", "bakery");
    ctx.seed_product("Honeycrisp Apples", "12.00", 40, Some(produce));
    ctx.seed_product("Sourdough Loaf", "6.50", 12, Some(bakery));
    let visitor = ctx.visitor();

    let categories: Value = visitor
        .get(ctx.url("/api/categories"))
        .send()
        .await
        .expect("Failed to list categories")
        .json()
        .await
        .expect("categories body");
    let names: Vec<&str> = categories
        .as_array()
        .expect("category list")
        .iter()
        .filter_map(|category| category["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Bakery", "Produce"]);

    let page: Value = visitor
        .get(ctx.url("/api/categories/produce"))
        .send()
        .await
        .expect("Failed to get category")
        .json()
        .await
        .expect("category body");
    assert_eq!(page["category"]["slug"], "produce");
    let products = page["products"].as_array().expect("products");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Honeycrisp Apples");
}

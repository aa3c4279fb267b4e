//! Integration tests for Greenbasket.
//!
//! The storefront runs in-process on an ephemeral port, talking to a
//! stateful fake of the hosted platform ([`FakePlatform`]). Tests drive it
//! over real HTTP with a cookie-keeping client, so visitor sessions behave
//! as they do for a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p greenbasket-integration-tests
//! ```

pub mod fake_platform;

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

use greenbasket_storefront::config::{PlatformConfig, StorefrontConfig};
use greenbasket_storefront::state::AppState;

pub use fake_platform::FakePlatform;

/// Password given to every seeded account.
pub const PASSWORD: &str = "greens-and-beans";

/// A running storefront wired to a fresh fake platform.
pub struct TestContext {
    pub platform: FakePlatform,
    pub base_url: String,
}

impl TestContext {
    /// Start the fake platform and the storefront.
    pub async fn start() -> Self {
        let platform = FakePlatform::start().await;

        let config = StorefrontConfig {
            host: "127.0.0.1".parse().expect("valid loopback address"),
            port: 0,
            base_url: "http://localhost:5173".to_string(),
            cors_origin: None,
            platform: PlatformConfig {
                url: platform.url(),
                anon_key: "test-anon-key".to_string(),
                service_role_key: None,
                timeout: Duration::from_secs(5),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let state = AppState::new(config).expect("Failed to build application state");
        let app = greenbasket_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener has an address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            platform,
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A new visitor with an empty cookie jar.
    #[must_use]
    pub fn visitor(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Seed a category and return its id.
    pub fn seed_category(&self, name: &str, slug: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.platform.seed(
            "categories",
            [json!({ "id": id, "name": name, "slug": slug, "created_at": "2024-05-01T10:00:00Z" })],
        );
        id
    }

    /// Seed an active product and return its id.
    pub fn seed_product(&self, name: &str, price: &str, stock: i32, category: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        let slug = name.to_lowercase().replace(' ', "-");
        self.platform.seed(
            "products",
            [json!({
                "id": id,
                "name": name,
                "slug": slug,
                "price": price,
                "stock_quantity": stock,
                "is_active": true,
                "category_id": category,
                "created_at": "2024-05-01T10:00:00Z",
            })],
        );
        id
    }

    /// Sign a visitor in through the API.
    pub async fn sign_in(&self, client: &Client, email: &str) -> Value {
        let response = client
            .post(self.url("/api/auth/sign-in"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to send sign-in");
        assert!(
            response.status().is_success(),
            "sign-in failed with {}",
            response.status()
        );
        response.json().await.expect("sign-in body is JSON")
    }

    /// Add a product to a visitor's cart and return the cart state.
    pub async fn add_to_cart(&self, client: &Client, product: Uuid, quantity: i32) -> Value {
        let response = client
            .post(self.url("/api/cart/items"))
            .json(&json!({ "product_id": product, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to add to cart");
        assert!(
            response.status().is_success(),
            "add to cart failed with {}",
            response.status()
        );
        response.json().await.expect("cart body is JSON")
    }

    /// Cart rows on the platform owned by `user`.
    #[must_use]
    pub fn cart_rows_of(&self, user: Uuid) -> Vec<Value> {
        let user = user.to_string();
        self.platform
            .rows("cart_items")
            .into_iter()
            .filter(|row| row.get("user_id").and_then(Value::as_str) == Some(user.as_str()))
            .collect()
    }
}

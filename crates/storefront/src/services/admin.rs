//! Back-office operations.
//!
//! Row security on the platform decides what an admin token may touch; the
//! storefront only gates routes on [`AdminService::check_is_admin`].

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use greenbasket_core::{CategoryId, OrderId, OrderStatus, Price, ProductId, Role, UserId};

use crate::models::{Category, CategoryInput, Order, Product, ProductInput, Stamped, UserRole};
use crate::platform::{self, PlatformClient, PlatformError, TableQuery};

const ORDER_SUMMARY_SELECT: &str =
    "*,items:order_items(id,quantity,price_at_purchase,product:products(id,name,image_url))";

/// Default page size for [`AdminService::recent_orders`].
pub const RECENT_ORDERS_LIMIT: usize = 10;

/// Default threshold for [`AdminService::low_stock_products`].
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_categories: u64,
    pub total_revenue: Price,
}

#[derive(Deserialize)]
struct OrderTotal {
    #[serde(default)]
    total_amount: Option<Price>,
}

#[derive(Deserialize)]
struct RoleOnly {
    role: Role,
}

/// Back-office service, run as an admin's access token or the service-role key.
pub struct AdminService<'a> {
    client: &'a PlatformClient,
    access_token: Option<&'a str>,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(client: &'a PlatformClient, access_token: Option<&'a str>) -> Self {
        Self {
            client,
            access_token,
        }
    }

    fn table(&self, name: &str) -> TableQuery<'a> {
        self.client.from(name).authorized(self.access_token)
    }

    // =========================================================================
    // Roles
    // =========================================================================

    /// Whether `user` holds the admin role. Lookup failures count as "no".
    #[instrument(skip(self))]
    pub async fn check_is_admin(&self, user: UserId) -> bool {
        let row: Result<Option<RoleOnly>, PlatformError> = self
            .table("user_roles")
            .select("role")
            .eq("user_id", user)
            .maybe_single()
            .await;

        match row {
            Ok(Some(row)) => row.role.is_admin(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Role lookup failed; treating as non-admin");
                false
            }
        }
    }

    /// The role row of `user`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn get_user_role(&self, user: UserId) -> Result<Option<UserRole>, PlatformError> {
        self.table("user_roles")
            .select("*")
            .eq("user_id", user)
            .maybe_single()
            .await
    }

    /// Every role row, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn list_user_roles(&self) -> Result<Vec<UserRole>, PlatformError> {
        self.table("user_roles")
            .select("*")
            .order("created_at", platform::Order::Desc)
            .fetch()
            .await
    }

    /// Change the role of `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails or the user has no role row.
    #[instrument(skip(self))]
    pub async fn update_user_role(
        &self,
        user: UserId,
        role: &Role,
    ) -> Result<UserRole, PlatformError> {
        let patch = json!({ "role": role.as_str() });
        platform::exactly_one(
            self.table("user_roles")
                .select("*")
                .eq("user_id", user)
                .update(&Stamped::now(&patch))
                .await?,
        )
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Product, order and category counts plus revenue, fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first error if any of the three calls fails.
    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, PlatformError> {
        let (total_products, (orders, total_orders), total_categories) = tokio::try_join!(
            self.table("products").select("id").count(),
            self.table("orders")
                .select("id,total_amount")
                .fetch_with_count::<OrderTotal>(),
            self.table("categories").select("id").count(),
        )?;

        let total_revenue = orders.iter().filter_map(|order| order.total_amount).sum();

        Ok(DashboardStats {
            total_products,
            total_orders,
            total_categories,
            total_revenue,
        })
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// The `limit` newest orders with their lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn recent_orders(&self, limit: usize) -> Result<Vec<Order>, PlatformError> {
        self.table("orders")
            .select(ORDER_SUMMARY_SELECT)
            .order("created_at", platform::Order::Desc)
            .limit(limit)
            .fetch()
            .await
    }

    /// Every order with its lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<Order>, PlatformError> {
        self.table("orders")
            .select(ORDER_SUMMARY_SELECT)
            .order("created_at", platform::Order::Desc)
            .fetch()
            .await
    }

    /// Move an order to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails or the order does not exist.
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, PlatformError> {
        let patch = json!({ "status": status });
        platform::exactly_one(
            self.table("orders")
                .select("*")
                .eq("id", order_id)
                .update(&Stamped::now(&patch))
                .await?,
        )
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the row (e.g. duplicate slug).
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<Product, PlatformError> {
        platform::exactly_one(self.table("products").select("*").insert(&[input]).await?)
    }

    /// Apply the set fields of `input` to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the change or the product does
    /// not exist.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, PlatformError> {
        platform::exactly_one(
            self.table("products")
                .select("*")
                .eq("id", product_id)
                .update(&Stamped::now(input))
                .await?,
        )
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails (e.g. the product is
    /// referenced by an order line).
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: ProductId) -> Result<(), PlatformError> {
        self.table("products").eq("id", product_id).delete().await
    }

    /// Active and inactive products with at most `threshold` units in stock,
    /// lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn low_stock_products(&self, threshold: i32) -> Result<Vec<Product>, PlatformError> {
        self.table("products")
            .select("*")
            .lte("stock_quantity", threshold)
            .order("stock_quantity", platform::Order::Asc)
            .fetch()
            .await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the row.
    #[instrument(skip(self, input))]
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, PlatformError> {
        platform::exactly_one(self.table("categories").select("*").insert(&[input]).await?)
    }

    /// Apply the set fields of `input` to a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the change or the category
    /// does not exist.
    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        category_id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, PlatformError> {
        platform::exactly_one(
            self.table("categories")
                .select("*")
                .eq("id", category_id)
                .update(&Stamped::now(input))
                .await?,
        )
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: CategoryId) -> Result<(), PlatformError> {
        self.table("categories").eq("id", category_id).delete().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use url::Url;
    use uuid::Uuid;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::PlatformConfig;

    fn client(server: &MockServer) -> PlatformClient {
        PlatformClient::new(&PlatformConfig {
            url: Url::parse(&server.uri()).unwrap(),
            anon_key: "anon".to_string(),
            service_role_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_check_is_admin() {
        let server = MockServer::start().await;
        let admin = Uuid::new_v4();
        let customer = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("user_id", format!("eq.{admin}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "role": "admin" }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("user_id", format!("eq.{customer}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "role": "customer" }])))
            .mount(&server)
            .await;

        let client = client(&server);
        let service = AdminService::new(&client, None);
        assert!(service.check_is_admin(UserId::new(admin)).await);
        assert!(!service.check_is_admin(UserId::new(customer)).await);
    }

    #[tokio::test]
    async fn test_check_is_admin_false_on_missing_row_or_error() {
        let server = MockServer::start().await;
        let missing = Uuid::new_v4();

        Mock::given(method("GET"))
            .and(path("/rest/v1/user_roles"))
            .and(query_param("user_id", format!("eq.{missing}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_roles"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client(&server);
        let service = AdminService::new(&client, None);
        assert!(!service.check_is_admin(UserId::new(missing)).await);
        assert!(!service.check_is_admin(UserId::new(Uuid::new_v4())).await);
    }

    #[tokio::test]
    async fn test_dashboard_stats() {
        let server = MockServer::start().await;

        Mock::given(method("HEAD"))
            .and(path("/rest/v1/products"))
            .and(header("prefer", "count=exact"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/12"))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/categories"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-range", "*/4"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/orders"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "0-1/2")
                    .set_body_json(json!([
                        { "id": Uuid::new_v4(), "total_amount": 94.0 },
                        { "id": Uuid::new_v4(), "total_amount": "12.50" }
                    ])),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let stats = AdminService::new(&client, None).dashboard_stats().await.unwrap();
        assert_eq!(stats.total_products, 12);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.total_categories, 4);
        assert_eq!(stats.total_revenue, Price::from_cents(10650));
    }

    #[tokio::test]
    async fn test_low_stock_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("stock_quantity", "lte.10"))
            .and(query_param("order", "stock_quantity.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let products = AdminService::new(&client, None)
            .low_stock_products(LOW_STOCK_THRESHOLD)
            .await
            .unwrap();
        assert!(products.is_empty());
    }
}

//! Product catalog reads.

use tracing::instrument;

use crate::models::Product;
use crate::platform::{Order, PlatformClient, PlatformError};

const LIST_SELECT: &str = "*,category:categories(id,name,slug)";
const DETAIL_SELECT: &str =
    "*,category:categories(id,name,slug),images:product_images(id,image_url,display_order)";
const BY_CATEGORY_SELECT: &str = "*,category:categories!inner(id,name,slug)";

/// Read-only access to active products.
pub struct ProductService<'a> {
    client: &'a PlatformClient,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// All active products with their category, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn list_active(&self) -> Result<Vec<Product>, PlatformError> {
        self.client
            .from("products")
            .select(LIST_SELECT)
            .eq("is_active", true)
            .order("created_at", Order::Desc)
            .fetch()
            .await
    }

    /// One active product with its category and images (by display order).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, PlatformError> {
        let product: Option<Product> = self
            .client
            .from("products")
            .select(DETAIL_SELECT)
            .eq("slug", slug)
            .eq("is_active", true)
            .maybe_single()
            .await?;

        Ok(product.map(|mut product| {
            if let Some(images) = product.images.as_mut() {
                images.sort_by_key(|image| image.display_order);
            }
            product
        }))
    }

    /// Active products whose category has this slug, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn list_by_category(&self, category_slug: &str) -> Result<Vec<Product>, PlatformError> {
        self.client
            .from("products")
            .select(BY_CATEGORY_SELECT)
            .eq("category.slug", category_slug)
            .eq("is_active", true)
            .order("created_at", Order::Desc)
            .fetch()
            .await
    }

    /// Active products whose name contains `term` (case-insensitive), newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Product>, PlatformError> {
        self.client
            .from("products")
            .select(LIST_SELECT)
            .eq("is_active", true)
            .ilike("name", &format!("%{term}%"))
            .order("created_at", Order::Desc)
            .fetch()
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
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

    fn product_row(slug: &str) -> serde_json::Value {
        json!({
            "id": uuid::Uuid::new_v4(),
            "name": slug,
            "slug": slug,
            "price": 12.0,
            "stock_quantity": 10,
            "is_active": true
        })
    }

    #[tokio::test]
    async fn test_search_uses_ilike_and_active_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("name", "ilike.%oil%"))
            .and(query_param("is_active", "eq.true"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_row("sunflower-oil")])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let products = ProductService::new(&client).search("oil").await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].slug, "sunflower-oil");
    }

    #[tokio::test]
    async fn test_list_by_category_filters_on_embedded_slug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("select", BY_CATEGORY_SELECT))
            .and(query_param("category.slug", "eq.pulses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let products = ProductService::new(&client)
            .list_by_category("pulses")
            .await
            .unwrap();
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_slug_orders_images() {
        let server = MockServer::start().await;
        let mut row = product_row("moong");
        row["images"] = json!([
            { "id": uuid::Uuid::new_v4(), "image_url": "b.jpg", "display_order": 2 },
            { "id": uuid::Uuid::new_v4(), "image_url": "a.jpg", "display_order": 1 }
        ]);
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .and(query_param("slug", "eq.moong"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
            .mount(&server)
            .await;

        let client = client(&server);
        let product = ProductService::new(&client)
            .get_by_slug("moong")
            .await
            .unwrap()
            .unwrap();
        let images = product.images.unwrap();
        assert_eq!(images[0].image_url, "a.jpg");
        assert_eq!(images[1].image_url, "b.jpg");
    }

    #[tokio::test]
    async fn test_get_by_slug_missing_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client(&server);
        let product = ProductService::new(&client).get_by_slug("nope").await.unwrap();
        assert!(product.is_none());
    }
}

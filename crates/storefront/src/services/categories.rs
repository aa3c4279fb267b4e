//! Category reads.

use tracing::instrument;

use crate::models::Category;
use crate::platform::{Order, PlatformClient, PlatformError};

/// Read-only access to categories.
pub struct CategoryService<'a> {
    client: &'a PlatformClient,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// All categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, PlatformError> {
        self.client
            .from("categories")
            .select("*")
            .order("name", Order::Asc)
            .fetch()
            .await
    }

    /// One category by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform call fails.
    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>, PlatformError> {
        self.client
            .from("categories")
            .select("*")
            .eq("slug", slug)
            .maybe_single()
            .await
    }
}

//! Query builder for the row API.
//!
//! Mirrors the platform's URL grammar: filters are `column=op.value` query
//! pairs, embedded selections go in `select=`, and writes are steered with
//! the `Prefer` header.

use std::fmt::Display;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::PlatformError;
use super::client::{PlatformClient, check_rest};

/// Sort direction for [`TableQuery::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A pending request against one table.
///
/// Built fluently, then consumed by one of the terminal methods
/// ([`fetch`](Self::fetch), [`maybe_single`](Self::maybe_single),
/// [`count`](Self::count), [`insert`](Self::insert), [`update`](Self::update),
/// [`delete`](Self::delete)).
#[must_use = "queries do nothing until a terminal method is awaited"]
pub struct TableQuery<'a> {
    client: &'a PlatformClient,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    limit: Option<usize>,
    bearer: Option<String>,
}

impl<'a> TableQuery<'a> {
    pub(super) fn new(client: &'a PlatformClient, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            bearer: None,
        }
    }

    /// Columns to return, including embedded selections such as
    /// `*,category:categories(id,name,slug)`. Whitespace is stripped.
    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.split_whitespace().collect());
        self
    }

    /// `column = value`.
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("eq.{value}")));
        self
    }

    /// `column IS NULL`.
    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// Case-insensitive `LIKE`; `%` is the wildcard.
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.filters.push((column.to_string(), format!("ilike.{pattern}")));
        self
    }

    /// `column <= value`.
    pub fn lte(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push((column.to_string(), format!("lte.{value}")));
        self
    }

    /// Append a sort key. Multiple calls sort by each key in turn.
    pub fn order(mut self, column: &str, direction: Order) -> Self {
        self.order.push(format!("{column}.{}", direction.as_str()));
        self
    }

    /// Maximum number of rows to return.
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run the request as the shopper holding this access token, so row
    /// security applies to them. `None` keeps the client's API key.
    pub fn authorized(mut self, access_token: Option<&str>) -> Self {
        self.bearer = access_token.map(String::from);
        self
    }

    /// The query pairs this request will carry, in order.
    pub(crate) fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    fn build(&self, method: Method) -> Result<reqwest::RequestBuilder, PlatformError> {
        let mut url = self.client.endpoint(&format!("rest/v1/{}", self.table))?;
        {
            let pairs = self.query_pairs();
            if !pairs.is_empty() {
                let mut serializer = url.query_pairs_mut();
                for (key, value) in &pairs {
                    serializer.append_pair(key, value);
                }
            }
        }
        Ok(self.client.request(method, url, self.bearer.as_deref()))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch every matching row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the platform rejects it, or the
    /// rows cannot be decoded into `T`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, PlatformError> {
        let response = check_rest(self.build(Method::GET)?.send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Fetch zero or one matching row.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::RowCount` if more than one row matches, plus
    /// the errors of [`fetch`](Self::fetch).
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, PlatformError> {
        at_most_one(self.fetch().await?)
    }

    /// Count matching rows without transferring them.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the platform rejects it, or the
    /// `Content-Range` header is missing.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn count(self) -> Result<u64, PlatformError> {
        let response = check_rest(
            self.build(Method::HEAD)?
                .header("Prefer", "count=exact")
                .send()
                .await?,
        )
        .await?;
        total_from_headers(response.headers())
    }

    /// Fetch every matching row together with the exact total count.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch) and [`count`](Self::count).
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch_with_count<T: DeserializeOwned>(self) -> Result<(Vec<T>, u64), PlatformError> {
        let response = check_rest(
            self.build(Method::GET)?
                .header("Prefer", "count=exact")
                .send()
                .await?,
        )
        .await?;
        let total = total_from_headers(response.headers())?;
        let text = response.text().await?;
        Ok((serde_json::from_str(&text)?, total))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Insert rows and return them as stored (shaped by `select`, if set).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the platform rejects it, or the
    /// returned rows cannot be decoded into `T`.
    #[instrument(skip(self, rows), fields(table = %self.table))]
    pub async fn insert<B, T>(self, rows: &B) -> Result<Vec<T>, PlatformError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = check_rest(
            self.build(Method::POST)?
                .header("Prefer", "return=representation")
                .json(rows)
                .send()
                .await?,
        )
        .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Insert rows without reading them back.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects it.
    #[instrument(skip(self, rows), fields(table = %self.table))]
    pub async fn insert_silent<B>(self, rows: &B) -> Result<(), PlatformError>
    where
        B: Serialize + ?Sized,
    {
        check_rest(
            self.build(Method::POST)?
                .header("Prefer", "return=minimal")
                .json(rows)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    /// Apply `patch` to every matching row in one statement and return the
    /// updated rows. The platform runs the statement atomically: either all
    /// matching rows change or none do.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the platform rejects it, or the
    /// returned rows cannot be decoded into `T`.
    #[instrument(skip(self, patch), fields(table = %self.table))]
    pub async fn update<B, T>(self, patch: &B) -> Result<Vec<T>, PlatformError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = check_rest(
            self.build(Method::PATCH)?
                .header("Prefer", "return=representation")
                .json(patch)
                .send()
                .await?,
        )
        .await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Delete every matching row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects it.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete(self) -> Result<(), PlatformError> {
        check_rest(self.build(Method::DELETE)?.send().await?).await?;
        Ok(())
    }
}

/// Reduce a row list to exactly one row.
///
/// # Errors
///
/// Returns `PlatformError::RowCount` unless `rows` has exactly one element.
pub fn exactly_one<T>(rows: Vec<T>) -> Result<T, PlatformError> {
    let actual = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (Some(row), None) => Ok(row),
        _ => Err(PlatformError::RowCount {
            expected: "exactly one row",
            actual,
        }),
    }
}

/// Reduce a row list to at most one row.
///
/// # Errors
///
/// Returns `PlatformError::RowCount` if `rows` has more than one element.
pub fn at_most_one<T>(rows: Vec<T>) -> Result<Option<T>, PlatformError> {
    let actual = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), rows.next()) {
        (row, None) => Ok(row),
        _ => Err(PlatformError::RowCount {
            expected: "at most one row",
            actual,
        }),
    }
}

/// Read the total from a `Content-Range: 0-9/42` (or `*/42`) header.
fn total_from_headers(headers: &HeaderMap) -> Result<u64, PlatformError> {
    headers
        .get("content-range")
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_total)
        .ok_or(PlatformError::RowCount {
            expected: "a Content-Range total",
            actual: 0,
        })
}

fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::config::PlatformConfig;

    fn client() -> PlatformClient {
        PlatformClient::new(&PlatformConfig {
            url: Url::parse("https://abc.platform.test").unwrap(),
            anon_key: "anon".to_string(),
            service_role_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_query_pairs_order() {
        let client = client();
        let query = client
            .from("cart_items")
            .select(
                "*,
                product:products(id, name, price)",
            )
            .eq("session_id", "s1")
            .is_null("user_id")
            .order("created_at", Order::Desc)
            .limit(5);

        assert_eq!(
            query.query_pairs(),
            vec![
                ("select".to_string(), "*,product:products(id,name,price)".to_string()),
                ("session_id".to_string(), "eq.s1".to_string()),
                ("user_id".to_string(), "is.null".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_pairs_filters_only() {
        let client = client();
        let query = client
            .from("products")
            .ilike("name", "%oil%")
            .lte("stock_quantity", 10)
            .eq("is_active", true);

        assert_eq!(
            query.query_pairs(),
            vec![
                ("name".to_string(), "ilike.%oil%".to_string()),
                ("stock_quantity".to_string(), "lte.10".to_string()),
                ("is_active".to_string(), "eq.true".to_string()),
            ]
        );
    }

    #[test]
    fn test_multiple_order_keys_join() {
        let client = client();
        let query = client
            .from("products")
            .order("stock_quantity", Order::Asc)
            .order("name", Order::Asc);
        assert_eq!(
            query.query_pairs(),
            vec![("order".to_string(), "stock_quantity.asc,name.asc".to_string())]
        );
    }

    #[test]
    fn test_exactly_one() {
        assert_eq!(exactly_one(vec![7]).unwrap(), 7);
        assert!(matches!(
            exactly_one::<i32>(vec![]),
            Err(PlatformError::RowCount { actual: 0, .. })
        ));
        assert!(matches!(
            exactly_one(vec![1, 2]),
            Err(PlatformError::RowCount { actual: 2, .. })
        ));
    }

    #[test]
    fn test_at_most_one() {
        assert_eq!(at_most_one::<i32>(vec![]).unwrap(), None);
        assert_eq!(at_most_one(vec![3]).unwrap(), Some(3));
        assert!(at_most_one(vec![1, 2]).is_err());
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}

//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::Product;
use crate::services::ProductService;
use crate::state::AppState;
use crate::store::{CatalogAction, CatalogState};

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring of the product name.
    pub search: Option<String>,
    /// Category slug to restrict the listing to.
    pub category: Option<String>,
}

/// Product listing.
///
/// Answers the folded listing state. A failed load is reported with 502 and
/// the `error` field set.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let products = ProductService::new(state.platform());
    let listing = CatalogState::default().apply(CatalogAction::LoadStarted);

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let category = query.category.as_deref().filter(|s| !s.is_empty());
    let loaded = match (search, category) {
        (Some(term), _) => products.search(term).await,
        (None, Some(slug)) => products.list_by_category(slug).await,
        (None, None) => products.list_active().await,
    };

    fold_listing(listing, loaded)
}

/// Fold a load result into the listing and choose the status to answer with.
fn fold_listing(
    listing: CatalogState,
    loaded: std::result::Result<Vec<Product>, crate::platform::PlatformError>,
) -> (StatusCode, Json<CatalogState>) {
    match loaded {
        Ok(products) => (
            StatusCode::OK,
            Json(listing.apply(CatalogAction::Loaded(products))),
        ),
        Err(e) => {
            let err = AppError::from(e);
            tracing::warn!(error = %err, "Failed to load products");
            (
                StatusCode::BAD_GATEWAY,
                Json(listing.apply(CatalogAction::LoadFailed(err.client_message()))),
            )
        }
    }
}

/// Product detail page data.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Result<Json<Product>> {
    ProductService::new(state.platform())
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

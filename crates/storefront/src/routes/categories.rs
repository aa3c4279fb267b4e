//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::{Category, Product};
use crate::services::{CategoryService, ProductService};
use crate::state::AppState;

/// A category page: the category and its active products.
#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub products: Vec<Product>,
}

/// Category listing.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryService::new(state.platform()).list().await?;
    Ok(Json(categories))
}

/// Category detail with its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryPage>> {
    let category = CategoryService::new(state.platform())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

    let products = ProductService::new(state.platform())
        .list_by_category(&category.slug)
        .await?;

    Ok(Json(CategoryPage { category, products }))
}

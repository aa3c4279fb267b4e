//! Product listing state.

use serde::{Deserialize, Serialize};

use crate::models::Product;

/// Events that change the product listing.
#[derive(Debug, Clone)]
pub enum CatalogAction {
    LoadStarted,
    Loaded(Vec<Product>),
    LoadFailed(String),
}

/// Products shown on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CatalogState {
    /// Fold one action into the state.
    #[must_use]
    pub fn apply(self, action: CatalogAction) -> Self {
        match action {
            CatalogAction::LoadStarted => Self {
                loading: true,
                error: None,
                ..self
            },
            CatalogAction::Loaded(products) => Self {
                products,
                loading: false,
                error: None,
            },
            CatalogAction::LoadFailed(message) => Self {
                loading: false,
                error: Some(message),
                ..self
            },
        }
    }
}

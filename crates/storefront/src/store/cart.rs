//! Cart summary state.

use serde::{Deserialize, Serialize};

use greenbasket_core::Price;

use crate::models::CartItem;

/// Events that change the cart summary.
#[derive(Debug, Clone)]
pub enum CartAction {
    /// A reload of the cart rows began.
    LoadStarted,
    /// The cart rows arrived.
    Loaded(Vec<CartItem>),
    /// The reload failed with this message.
    LoadFailed(String),
    /// The cart was emptied.
    Cleared,
}

/// What the client renders for the cart badge and cart page.
///
/// Kept in the visitor session between requests, so a failed reload still
/// answers with the items from the last successful one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    /// Sum of quantities across all lines.
    pub item_count: i64,
    /// Sum of unit price times quantity across all lines.
    pub total_price: Price,
    pub items: Vec<CartItem>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CartState {
    /// Fold one action into the state.
    #[must_use]
    pub fn apply(self, action: CartAction) -> Self {
        match action {
            CartAction::LoadStarted => Self {
                loading: true,
                ..self
            },
            CartAction::Loaded(items) => Self {
                item_count: items.iter().map(|item| i64::from(item.quantity)).sum(),
                total_price: items.iter().map(CartItem::line_total).sum(),
                items,
                loading: false,
                error: None,
            },
            CartAction::LoadFailed(message) => Self {
                loading: false,
                error: Some(message),
                ..self
            },
            CartAction::Cleared => Self {
                item_count: 0,
                total_price: Price::ZERO,
                items: Vec::new(),
                ..self
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::CartProduct;
    use greenbasket_core::{CartItemId, ProductId};
    use uuid::Uuid;

    fn item(cents: i64, quantity: i32) -> CartItem {
        let product_id = ProductId::new(Uuid::new_v4());
        CartItem {
            id: CartItemId::new(Uuid::new_v4()),
            product_id,
            quantity,
            user_id: None,
            session_id: Some("s1".to_string()),
            created_at: None,
            updated_at: None,
            product: Some(CartProduct {
                id: product_id,
                name: "Item".to_string(),
                slug: "item".to_string(),
                price: Price::from_cents(cents),
                image_url: None,
                stock_quantity: 100,
            }),
        }
    }

    fn expected_total(items: &[CartItem]) -> Price {
        items
            .iter()
            .map(|i| i.product.as_ref().unwrap().price.line_total(u32::try_from(i.quantity).unwrap()))
            .sum()
    }

    #[test]
    fn test_loaded_computes_totals() {
        let items = vec![item(1200, 2), item(7000, 1)];
        let state = CartState::default()
            .apply(CartAction::LoadStarted)
            .apply(CartAction::Loaded(items));

        assert!(!state.loading);
        assert_eq!(state.item_count, 3);
        assert_eq!(state.total_price, Price::from_cents(9400));
        assert_eq!(state.items.len(), 2);
    }

    #[test]
    fn test_total_tracks_every_reload() {
        // add A, add B, bump A, remove B
        let a = item(1200, 1);
        let b = item(8000, 2);
        let mut a_bumped = a.clone();
        a_bumped.quantity = 3;

        let snapshots = vec![
            vec![a.clone()],
            vec![a, b.clone()],
            vec![a_bumped.clone(), b],
            vec![a_bumped],
        ];

        let mut state = CartState::default();
        for items in snapshots {
            let expected = expected_total(&items);
            state = state
                .apply(CartAction::LoadStarted)
                .apply(CartAction::Loaded(items));
            assert_eq!(state.total_price, expected);
        }
        assert_eq!(state.total_price.to_string(), "$36.00");
        assert_eq!(state.item_count, 3);
    }

    #[test]
    fn test_load_failed_keeps_previous_items() {
        let state = CartState::default()
            .apply(CartAction::Loaded(vec![item(1200, 2)]))
            .apply(CartAction::LoadStarted)
            .apply(CartAction::LoadFailed("network down".to_string()));

        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("network down"));
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.item_count, 2);
        assert_eq!(state.total_price, Price::from_cents(2400));
    }

    #[test]
    fn test_load_started_keeps_error() {
        let state = CartState::default()
            .apply(CartAction::LoadFailed("boom".to_string()))
            .apply(CartAction::LoadStarted);
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_cleared_resets_totals() {
        let state = CartState::default()
            .apply(CartAction::Loaded(vec![item(1200, 2), item(500, 4)]))
            .apply(CartAction::Cleared);

        assert_eq!(state.item_count, 0);
        assert_eq!(state.total_price, Price::ZERO);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_state_round_trips_through_session_json() {
        let state = CartState::default().apply(CartAction::Loaded(vec![item(1200, 2)]));
        let json = serde_json::to_value(&state).unwrap();
        let restored: CartState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }
}

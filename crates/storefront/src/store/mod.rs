//! View state folded from load events.
//!
//! Each state is a pure reducer: `state.apply(action)` returns the next state
//! and does nothing else. Route handlers dispatch `LoadStarted`, perform the
//! platform call, then dispatch the outcome, so the state returned to the
//! client always reflects the last action applied.

pub mod cart;
pub mod catalog;

pub use cart::{CartAction, CartState};
pub use catalog::{CatalogAction, CatalogState};

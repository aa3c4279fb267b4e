//! Core types for Greenbasket.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use cart::{CartOwner, GuestSessionId};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::*;

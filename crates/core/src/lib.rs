//! Greenbasket Core - Shared types library.
//!
//! This crate provides common types used across all Greenbasket components:
//! - `storefront` - Public JSON API and admin back-office routes
//! - `cli` - Command-line tools for back-office chores
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no platform
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, statuses, and cart ownership

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

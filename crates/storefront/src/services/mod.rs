//! Business logic services for storefront.
//!
//! # Services
//!
//! - `products` / `categories` - Public catalog reads
//! - `cart` - Cart rows for a user or guest, including the guest cart merge
//! - `orders` - Checkout and order history
//! - `admin` - Back-office reads and writes, role checks
//! - `auth` - Sign-up, sign-in, session refresh, password and profile changes
//!
//! Each service borrows the [`PlatformClient`](crate::platform::PlatformClient)
//! and issues one request (or one concurrent fan-out) per operation. Services
//! that touch rows protected by row security also carry the shopper's access
//! token.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;

pub use admin::{AdminService, DashboardStats};
pub use auth::{AuthError, AuthEvent, AuthEventKind, AuthEvents, AuthService, AuthSubscription};
pub use cart::{CartService, MergeOutcome};
pub use categories::CategoryService;
pub use orders::{CheckoutError, OrderService};
pub use products::ProductService;

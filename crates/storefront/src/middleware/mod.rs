//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (credentialed calls from the shop front-end)
//! 4. Session layer (tower-sessions with in-memory store)

pub mod auth;
pub mod session;
pub mod shopper;

pub use auth::{AuthRejection, OptionalAuth, RequireAdmin, RequireAuth};
pub use session::create_session_layer;
pub use shopper::Shopper;

//! Greenbasket Storefront library.
//!
//! This crate provides the storefront JSON API as a library, allowing it to
//! be tested and reused. The binary in `main.rs` only wires configuration,
//! tracing and the listener around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod platform;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the full application router with its middleware stack.
#[must_use]
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());
    let cors = cors_layer(state.config().cors_origin.as_deref());

    let router = routes::routes()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http());
    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Credentialed CORS for the shop front-end origin, if one is configured.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    let Ok(origin) = HeaderValue::from_str(origin) else {
        tracing::warn!(origin, "Ignoring invalid CORS origin");
        return None;
    };

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_requires_origin() {
        assert!(cors_layer(None).is_none());
        assert!(cors_layer(Some("bad\norigin")).is_none());
        assert!(cors_layer(Some("http://localhost:5173")).is_some());
    }
}

//! Authentication extractors.
//!
//! Provides extractors for requiring a signed-in shopper (and, for the
//! back-office, an admin) in route handlers. Expiring access tokens are
//! refreshed on the way in.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::shopper::Shopper;
use crate::services::admin::AdminService;
use crate::services::auth::{AuthService, Authenticated};
use crate::state::AppState;

/// Extractor that requires a signed-in shopper.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(auth): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", auth.user.id)
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

/// Extractor that requires a signed-in shopper with the admin role.
pub struct RequireAdmin(pub Authenticated);

/// Extractor that optionally gets the signed-in shopper.
///
/// Unlike `RequireAuth`, this does not reject anonymous visitors.
pub struct OptionalAuth(pub Option<Authenticated>);

/// Error returned when an extractor's requirement is not met.
#[derive(Debug)]
pub enum AuthRejection {
    /// No signed-in shopper.
    Unauthorized,
    /// Signed in, but not an admin.
    Forbidden,
    /// The session could not be read.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Please sign in to continue"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::SessionUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn authenticate(
    parts: &mut Parts,
    state: &AppState,
) -> Result<Option<Authenticated>, AuthRejection> {
    let shopper = Shopper::from_request_parts(parts, state)
        .await
        .map_err(|_| AuthRejection::SessionUnavailable)?;

    AuthService::new(state.platform(), state.auth_events())
        .authenticate(&shopper)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to authenticate request");
            AuthRejection::SessionUnavailable
        })
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .await?
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).await?))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = authenticate(parts, state)
            .await?
            .ok_or(AuthRejection::Unauthorized)?;

        let is_admin = AdminService::new(state.platform(), Some(&auth.access_token))
            .check_is_admin(auth.user.id)
            .await;
        if !is_admin {
            tracing::warn!(user_id = %auth.user.id, "Non-admin requested back-office route");
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(auth))
    }
}

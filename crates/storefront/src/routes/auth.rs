//! Authentication route handlers.
//!
//! Sign-up, sign-in and sign-out, password reset and change, profile edits,
//! and the current-session probe the front-end polls on load.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, Shopper};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::services::auth::{SignUpResult, validate_confirmation};
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Sign-in request body.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Password reset request body.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Password change request body.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// Profile edit request body.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Current-session response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: Option<CurrentUser>,
}

/// Acknowledgement with a human-readable message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account.
#[instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(body): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResult>)> {
    validate_confirmation(&body.password, body.confirm_password.as_deref())?;

    let result = AuthService::new(state.platform(), state.auth_events())
        .sign_up(&shopper, &body.email, &body.password, body.name.as_deref())
        .await?;

    if !result.confirmation_required {
        set_sentry_user(&result.user.id, result.user.email.as_deref());
    }
    Ok((StatusCode::CREATED, Json(result)))
}

/// Sign in with email and password.
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    shopper: Shopper,
    Json(body): Json<SignInRequest>,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.platform(), state.auth_events())
        .sign_in(&shopper, &body.email, &body.password)
        .await?;

    set_sentry_user(&user.id, user.email.as_deref());
    Ok(Json(user))
}

/// Sign out.
#[instrument(skip_all)]
pub async fn sign_out(State(state): State<AppState>, shopper: Shopper) -> Result<StatusCode> {
    AuthService::new(state.platform(), state.auth_events())
        .sign_out(&shopper)
        .await?;

    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Email a password reset link.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let redirect_to = state.config().password_reset_redirect();
    AuthService::new(state.platform(), state.auth_events())
        .reset_password(&body.email, &redirect_to)
        .await?;

    Ok(Json(MessageResponse {
        message: "Check your email for the password reset link",
    }))
}

/// The signed-in user, if any.
///
/// Also retries a guest cart merge that sign-in could not finish.
#[instrument(skip_all)]
pub async fn session(
    State(state): State<AppState>,
    shopper: Shopper,
) -> Result<Json<SessionResponse>> {
    let user = AuthService::new(state.platform(), state.auth_events())
        .current_session(&shopper)
        .await?;
    Ok(Json(SessionResponse { user }))
}

/// Change the signed-in user's password.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(body): Json<UpdatePasswordRequest>,
) -> Result<StatusCode> {
    validate_confirmation(&body.password, body.confirm_password.as_deref())?;

    AuthService::new(state.platform(), state.auth_events())
        .update_password(&auth, &body.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Update the signed-in user's name and phone.
#[instrument(skip_all, fields(user_id = %auth.user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    shopper: Shopper,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<CurrentUser>> {
    let user = AuthService::new(state.platform(), state.auth_events())
        .update_profile(&shopper, &auth, &body.name, body.phone.as_deref())
        .await?;
    Ok(Json(user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_request_optional_fields() {
        let body: SignUpRequest =
            serde_json::from_str(r#"{"email":"ann@example.com","password":"secret1"}"#).unwrap();
        assert!(body.confirm_password.is_none());
        assert!(body.name.is_none());
    }

    #[test]
    fn test_session_response_serializes_null_user() {
        let json = serde_json::to_value(SessionResponse { user: None }).unwrap();
        assert_eq!(json, serde_json::json!({ "user": null }));
    }
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Responses carry a JSON body `{"error": message}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::middleware::shopper::SessionError;
use crate::platform::PlatformError;
use crate::services::auth::AuthError;
use crate::services::orders::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Platform call failed.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Platform(err) => platform_status(err),
            Self::Auth(err) => match err {
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidName(_) => StatusCode::BAD_REQUEST,
                AuthError::NotSignedIn => StatusCode::UNAUTHORIZED,
                AuthError::Platform(err) => platform_status(err),
                AuthError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::ProductUnavailable(_) => {
                    StatusCode::BAD_REQUEST
                }
                CheckoutError::Platform(err) => platform_status(err),
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The message shown to the client.
    ///
    /// Platform rejections and validation failures are shown verbatim;
    /// transport and internal failures are not.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Platform(err)
            | Self::Auth(AuthError::Platform(err))
            | Self::Checkout(CheckoutError::Platform(err)) => platform_message(err),
            Self::Auth(AuthError::InvalidEmail(_)) => "Please enter a valid email address".to_string(),
            Self::Auth(AuthError::NotSignedIn) => "Please sign in to continue".to_string(),
            Self::Auth(AuthError::Session(_)) | Self::Session(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            Self::Auth(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }

    fn is_server_fault(&self) -> bool {
        match self {
            Self::Platform(err)
            | Self::Auth(AuthError::Platform(err))
            | Self::Checkout(CheckoutError::Platform(err)) => {
                !err.is_rejection() || err.status().is_some_and(|status| status >= 500)
            }
            Self::Session(_) | Self::Internal(_) | Self::Auth(AuthError::Session(_)) => true,
            _ => false,
        }
    }
}

fn platform_status(err: &PlatformError) -> StatusCode {
    match err {
        PlatformError::Api { status, .. } | PlatformError::Auth { status, .. } => {
            match StatusCode::from_u16(*status) {
                Ok(status) if status.is_client_error() => status,
                _ => StatusCode::BAD_GATEWAY,
            }
        }
        PlatformError::RowCount { actual: 0, .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn platform_message(err: &PlatformError) -> String {
    if err.is_rejection() {
        err.to_string()
    } else {
        "External service error".to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_fault() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on sign-out to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

//! Client for the hosted data platform.
//!
//! # Architecture
//!
//! - The platform is the source of truth - NO local persistence, direct API calls
//! - Row API (`/rest/v1/{table}`): filtered select, insert, update, delete,
//!   with joins expressed as embedded-selection strings resolved remotely
//! - Auth API (`/auth/v1/...`): sign-up, password sign-in, token refresh,
//!   user lookup/update, sign-out, password recovery
//! - Row-level security is enforced by the platform based on the bearer token,
//!   so user-scoped queries must carry the shopper's access token
//!
//! # Example
//!
//! ```rust,ignore
//! use greenbasket_storefront::platform::{Order, PlatformClient};
//!
//! let client = PlatformClient::new(&config.platform)?;
//!
//! let products: Vec<Product> = client
//!     .from("products")
//!     .select("*,category:categories(id,name,slug)")
//!     .eq("is_active", true)
//!     .order("created_at", Order::Desc)
//!     .fetch()
//!     .await?;
//!
//! let session = client.auth().sign_in_with_password(&email, "hunter22").await?;
//! ```

mod auth;
mod client;
mod query;
pub mod types;

pub use auth::AuthClient;
pub use client::PlatformClient;
pub use query::{Order, TableQuery, at_most_one, exactly_one};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The row API rejected the request. The message is the platform's own.
    #[error("{message}")]
    Api {
        /// HTTP status returned by the platform.
        status: u16,
        /// Platform error code (e.g. `PGRST116`, `23505`).
        code: Option<String>,
        /// Human-readable message, verbatim.
        message: String,
        /// Additional detail, if any.
        details: Option<String>,
        /// Suggested fix, if any.
        hint: Option<String>,
    },

    /// The auth API rejected the request. The message is the platform's own.
    #[error("{message}")]
    Auth {
        /// HTTP status returned by the platform.
        status: u16,
        /// Human-readable message, verbatim.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A request expected a specific number of rows and got another.
    #[error("expected {expected}, got {actual} rows")]
    RowCount {
        /// What the caller asked for ("exactly one row", "at most one row").
        expected: &'static str,
        /// Rows actually returned.
        actual: usize,
    },

    /// A request URL could not be built.
    #[error("invalid platform URL: {0}")]
    Url(#[from] url::ParseError),
}

impl PlatformError {
    /// HTTP status the platform answered with, when it answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Auth { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error originated from the platform's validation or
    /// security rules rather than from transport or decoding.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Auth { .. } | Self::RowCount { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_message_verbatim() {
        let err = PlatformError::Api {
            status: 409,
            code: Some("23505".to_string()),
            message: "duplicate key value violates unique constraint \"products_slug_key\""
                .to_string(),
            details: None,
            hint: None,
        };
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"products_slug_key\""
        );
        assert_eq!(err.status(), Some(409));
        assert!(err.is_rejection());
    }

    #[test]
    fn test_auth_error_displays_message_verbatim() {
        let err = PlatformError::Auth {
            status: 400,
            message: "Invalid login credentials".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_row_count_error() {
        let err = PlatformError::RowCount {
            expected: "exactly one row",
            actual: 0,
        };
        assert_eq!(err.to_string(), "expected exactly one row, got 0 rows");
        assert_eq!(err.status(), None);
    }
}

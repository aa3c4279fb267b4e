//! Session-related types.
//!
//! Types stored in the visitor session for authentication and cart state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::{CartOwner, UserId};

use crate::platform::{AuthSession, AuthUser};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Platform user ID.
    pub id: UserId,
    /// User's email address, as the platform reports it.
    pub email: Option<String>,
    /// Profile metadata (`name`, `phone`).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl CurrentUser {
    /// The cart owner for this user's rows.
    #[must_use]
    pub const fn cart_owner(&self) -> CartOwner {
        CartOwner::User(self.id)
    }
}

impl From<AuthUser> for CurrentUser {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            metadata: user.user_metadata,
        }
    }
}

/// Platform tokens held for a signed-in visitor.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, Serialize, Deserialize)]
pub struct PlatformCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl PlatformCredentials {
    /// Whether the access token expires within `margin` of `now`.
    #[must_use]
    pub fn expires_within(&self, margin: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - now <= margin
    }
}

impl From<&AuthSession> for PlatformCredentials {
    fn from(session: &AuthSession) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at(),
        }
    }
}

impl std::fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Session keys for visitor data.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the platform access and refresh tokens.
    pub const PLATFORM_SESSION: &str = "platform_session";

    /// Key for the guest cart identifier of an anonymous visitor.
    pub const CART_SESSION_ID: &str = "cart_session_id";

    /// Key for the persisted cart view state.
    pub const CART_STATE: &str = "cart_state";
}

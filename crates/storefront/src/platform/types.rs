//! Auth API payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use greenbasket_core::UserId;

/// A user as reported by the auth API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form profile data (`name`, `phone`).
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl AuthUser {
    /// Display name from the profile metadata, if one was saved.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.user_metadata.get("name").and_then(|v| v.as_str())
    }
}

/// Tokens issued on sign-in or refresh.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds.
    pub expires_in: i64,
    /// Absolute expiry as a unix timestamp, when the platform sends one.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl AuthSession {
    /// When the access token stops being accepted.
    ///
    /// Falls back to `now + expires_in` if the platform omitted the absolute
    /// timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(self.expires_in))
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Result of a sign-up.
///
/// Projects that confirm email addresses return only the user; otherwise the
/// new account is signed in straight away.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired(AuthUser),
}

impl SignUpOutcome {
    /// The account that was created.
    #[must_use]
    pub const fn user(&self) -> &AuthUser {
        match self {
            Self::SignedIn(session) => &session.user,
            Self::ConfirmationRequired(user) => user,
        }
    }
}

/// Fields accepted by `PUT /auth/v1/user`.
#[derive(Clone, Default, Serialize)]
pub struct UserAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl std::fmt::Debug for UserAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAttributes")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_json() -> serde_json::Value {
        json!({
            "id": "7c4b7a0e-4b7e-4d55-9d2b-0d3b1f1e8a11",
            "email": "ann@example.com",
            "user_metadata": { "name": "Ann Smith" },
            "created_at": "2024-05-01T10:00:00Z"
        })
    }

    #[test]
    fn test_sign_up_outcome_with_session() {
        let body = json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "expires_at": 1_700_003_600,
            "user": user_json()
        });
        let outcome: SignUpOutcome = serde_json::from_value(body).unwrap();
        assert!(matches!(outcome, SignUpOutcome::SignedIn(_)));
        assert_eq!(outcome.user().display_name(), Some("Ann Smith"));
    }

    #[test]
    fn test_sign_up_outcome_needs_confirmation() {
        let outcome: SignUpOutcome = serde_json::from_value(user_json()).unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired(_)));
        assert_eq!(outcome.user().email.as_deref(), Some("ann@example.com"));
    }

    #[test]
    fn test_session_expiry_prefers_absolute_timestamp() {
        let session: AuthSession = serde_json::from_value(json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "expires_at": 1_700_003_600,
            "user": user_json()
        }))
        .unwrap();
        assert_eq!(session.expires_at().timestamp(), 1_700_003_600);
    }

    #[test]
    fn test_session_debug_redacts_tokens() {
        let session: AuthSession = serde_json::from_value(json!({
            "access_token": "secret-access",
            "refresh_token": "secret-refresh",
            "expires_in": 3600,
            "user": user_json()
        }))
        .unwrap();
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
    }

    #[test]
    fn test_user_attributes_skip_unset_fields() {
        let attrs = UserAttributes {
            password: None,
            data: Some(json!({ "name": "Ann" })),
        };
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            json!({ "data": { "name": "Ann" } })
        );
    }
}

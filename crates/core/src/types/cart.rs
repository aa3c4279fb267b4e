//! Cart ownership.
//!
//! A cart row belongs either to a signed-in user or to an anonymous visitor
//! identified by a guest session id, never both and never neither. Modelling
//! the owner as an enum keeps that invariant in the type system; the
//! platform columns (`user_id`, `session_id`) are derived from it.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Identifier for an unauthenticated shopper's cart.
///
/// Generated on the visitor's first cart interaction as
/// `session_{unix_millis}_{9 base36 chars}` and kept in the visitor session
/// until their cart is merged into an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestSessionId(String);

impl GuestSessionId {
    /// Prefix shared by every generated identifier.
    pub const PREFIX: &'static str = "session_";

    /// Wrap an existing identifier.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Build an identifier from its timestamp and random suffix.
    #[must_use]
    pub fn from_parts(unix_millis: i64, suffix: &str) -> Self {
        Self(format!("{}{unix_millis}_{suffix}", Self::PREFIX))
    }

    /// The identifier as stored in the `session_id` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuestSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of a set of cart rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// Rows keyed by `user_id`.
    User(UserId),
    /// Rows keyed by `session_id` with a null `user_id`.
    Guest(GuestSessionId),
}

impl CartOwner {
    /// Value for the `user_id` column.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// Value for the `session_id` column.
    #[must_use]
    pub const fn session_id(&self) -> Option<&GuestSessionId> {
        match self {
            Self::User(_) => None,
            Self::Guest(session) => Some(session),
        }
    }

    /// Whether the owner is an anonymous visitor.
    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest(_))
    }
}

impl fmt::Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Guest(session) => write!(f, "guest:{session}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_guest_session_id_format() {
        let id = GuestSessionId::from_parts(1_700_000_000_000, "k3j9x0a1b");
        assert_eq!(id.as_str(), "session_1700000000000_k3j9x0a1b");
    }

    #[test]
    fn test_owner_columns_are_exclusive() {
        let user = CartOwner::User(UserId::new(Uuid::new_v4()));
        assert!(user.user_id().is_some());
        assert!(user.session_id().is_none());
        assert!(!user.is_guest());

        let guest = CartOwner::Guest(GuestSessionId::new("s1".to_string()));
        assert!(guest.user_id().is_none());
        assert_eq!(guest.session_id().map(GuestSessionId::as_str), Some("s1"));
        assert!(guest.is_guest());
    }
}

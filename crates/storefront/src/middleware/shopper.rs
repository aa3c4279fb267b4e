//! The visitor session as an explicit object.
//!
//! [`Shopper`] wraps the tower-sessions [`Session`] and is the only place that
//! knows which keys hold what: the signed-in user, their platform tokens, the
//! guest cart id and the cached cart view state. Handlers extract it and hand
//! it (or values read from it) to services.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use chrono::Utc;
use rand::Rng;
use tower_sessions::Session;

use greenbasket_core::{CartOwner, GuestSessionId};

use crate::models::session::{CurrentUser, PlatformCredentials, keys};
use crate::store::CartState;

/// Number of random base-36 characters in a guest cart id.
const GUEST_SUFFIX_LEN: usize = 9;

/// Error type for session reads and writes.
pub type SessionError = tower_sessions::session::Error;

/// Per-request view of the visitor session.
#[derive(Clone)]
pub struct Shopper {
    session: Session,
}

impl<S> FromRequestParts<S> for Shopper
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::new(session))
    }
}

impl Shopper {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn user(&self) -> Result<Option<CurrentUser>, SessionError> {
        self.session.get(keys::CURRENT_USER).await
    }

    /// The platform tokens of the signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn credentials(&self) -> Result<Option<PlatformCredentials>, SessionError> {
        self.session.get(keys::PLATFORM_SESSION).await
    }

    /// The access token to run row queries as, if signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn access_token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.credentials().await?.map(|c| c.access_token))
    }

    /// Record a fresh sign-in. Rotates the session id against fixation and
    /// drops the cart state cached for the guest.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn establish(
        &self,
        user: &CurrentUser,
        credentials: &PlatformCredentials,
    ) -> Result<(), SessionError> {
        self.session.cycle_id().await?;
        self.session
            .remove::<serde_json::Value>(keys::CART_STATE)
            .await?;
        self.session.insert(keys::CURRENT_USER, user).await?;
        self.session.insert(keys::PLATFORM_SESSION, credentials).await
    }

    /// Replace the stored user (e.g. after a profile change).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_user(&self, user: &CurrentUser) -> Result<(), SessionError> {
        self.session.insert(keys::CURRENT_USER, user).await
    }

    /// Replace the stored tokens (e.g. after a refresh).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_credentials(
        &self,
        credentials: &PlatformCredentials,
    ) -> Result<(), SessionError> {
        self.session.insert(keys::PLATFORM_SESSION, credentials).await
    }

    /// Forget the signed-in user, their tokens and the cached cart.
    ///
    /// A guest cart id that is still present survives, so an unmerged guest
    /// cart stays reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.session
            .remove::<serde_json::Value>(keys::CURRENT_USER)
            .await?;
        self.session
            .remove::<serde_json::Value>(keys::PLATFORM_SESSION)
            .await?;
        self.session
            .remove::<serde_json::Value>(keys::CART_STATE)
            .await?;
        self.session.cycle_id().await
    }

    // =========================================================================
    // Cart ownership
    // =========================================================================

    /// The guest cart id, if one was ever issued and not yet retired.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn guest_session_id(&self) -> Result<Option<GuestSessionId>, SessionError> {
        self.session.get(keys::CART_SESSION_ID).await
    }

    /// Who owns the cart rows of this visitor.
    ///
    /// Signed-in visitors own rows by user id. Anonymous visitors get a guest
    /// id, issued on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cart_owner(&self) -> Result<CartOwner, SessionError> {
        if let Some(user) = self.user().await? {
            return Ok(user.cart_owner());
        }

        if let Some(guest) = self.guest_session_id().await? {
            return Ok(CartOwner::Guest(guest));
        }

        let guest = generate_guest_session_id();
        self.session.insert(keys::CART_SESSION_ID, &guest).await?;
        tracing::debug!(guest = %guest, "Issued guest cart id");
        Ok(CartOwner::Guest(guest))
    }

    /// Drop the guest cart id after its rows were handed to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn retire_guest_session(&self) -> Result<(), SessionError> {
        self.session
            .remove::<GuestSessionId>(keys::CART_SESSION_ID)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Cart view state
    // =========================================================================

    /// The last cart state handed to this visitor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cart_state(&self) -> Result<CartState, SessionError> {
        Ok(self
            .session
            .get(keys::CART_STATE)
            .await?
            .unwrap_or_default())
    }

    /// Persist the cart state for the next request.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_cart_state(&self, state: &CartState) -> Result<(), SessionError> {
        self.session.insert(keys::CART_STATE, state).await
    }
}

/// Build a new `session_{unix_millis}_{9 base-36 chars}` guest cart id.
fn generate_guest_session_id() -> GuestSessionId {
    let mut rng = rand::rng();
    let suffix: String = (0..GUEST_SUFFIX_LEN)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();
    GuestSessionId::from_parts(Utc::now().timestamp_millis(), &suffix)
}

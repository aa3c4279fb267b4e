//! Authentication service.
//!
//! Talks to the platform's auth API and keeps the visitor session in step:
//! a sign-in stores the user and tokens on the [`Shopper`], merges any guest
//! cart, and publishes an [`AuthEvent`].

mod error;
mod events;

pub use error::AuthError;
pub use events::{AuthEvent, AuthEventKind, AuthEvents, AuthSubscription};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use greenbasket_core::Email;

use crate::middleware::shopper::Shopper;
use crate::models::session::{CurrentUser, PlatformCredentials};
use crate::platform::{AuthSession, PlatformClient, SignUpOutcome, UserAttributes};
use crate::services::cart::{CartService, MergeOutcome};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum display name length, after trimming.
pub const MIN_NAME_LENGTH: usize = 2;

/// Refresh the access token when it expires within this many seconds.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// A signed-in visitor with a usable access token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: CurrentUser,
    pub access_token: String,
}

/// Result of a sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct SignUpResult {
    pub user: CurrentUser,
    /// The account must confirm its email before it can sign in.
    pub confirmation_required: bool,
}

/// Authentication service.
pub struct AuthService<'a> {
    client: &'a PlatformClient,
    events: &'a AuthEvents,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: &'a PlatformClient, events: &'a AuthEvents) -> Self {
        Self { client, events }
    }

    // =========================================================================
    // Sign-up / Sign-in / Sign-out
    // =========================================================================

    /// Register a new account. If the platform signs the account in straight
    /// away, the visitor session is established as for [`sign_in`](Self::sign_in).
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, short password or
    /// name, or `AuthError::Platform` with the platform's message.
    #[instrument(skip(self, shopper, password))]
    pub async fn sign_up(
        &self,
        shopper: &Shopper,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<SignUpResult, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let metadata = match name {
            Some(name) => json!({ "name": validate_name(name)? }),
            None => json!({}),
        };

        let outcome = self
            .client
            .auth()
            .sign_up(&email, password, &metadata)
            .await?;

        match outcome {
            SignUpOutcome::SignedIn(session) => Ok(SignUpResult {
                user: self.begin_session(shopper, &session).await?,
                confirmation_required: false,
            }),
            SignUpOutcome::ConfirmationRequired(user) => {
                tracing::info!(user_id = %user.id, "Account created; awaiting email confirmation");
                Ok(SignUpResult {
                    user: user.into(),
                    confirmation_required: true,
                })
            }
        }
    }

    /// Sign in with email and password.
    ///
    /// Stores the user and tokens on the visitor session, merges the guest
    /// cart (a failed merge is logged and retried later; it does not fail the
    /// sign-in) and publishes `SignedIn`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Platform` with the platform's message (e.g.
    /// "Invalid login credentials").
    #[instrument(skip(self, shopper, password))]
    pub async fn sign_in(
        &self,
        shopper: &Shopper,
        email: &str,
        password: &str,
    ) -> Result<CurrentUser, AuthError> {
        let email = Email::parse(email)?;
        let session = self
            .client
            .auth()
            .sign_in_with_password(&email, password)
            .await?;
        self.begin_session(shopper, &session).await
    }

    /// Sign out: revoke the platform session and forget the user.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails. A platform-side failure
    /// to revoke is logged; the visitor is signed out locally regardless.
    #[instrument(skip(self, shopper))]
    pub async fn sign_out(&self, shopper: &Shopper) -> Result<(), AuthError> {
        let user = shopper.user().await?;
        if let Some(credentials) = shopper.credentials().await? {
            if let Err(e) = self.client.auth().sign_out(&credentials.access_token).await {
                tracing::warn!(error = %e, "Platform sign-out failed");
            }
        }

        shopper.clear().await?;
        if let Some(user) = user {
            self.events.publish(AuthEventKind::SignedOut, Some(user.id));
        }
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The signed-in visitor, with the access token refreshed if it was about
    /// to expire.
    ///
    /// A refresh the platform rejects signs the visitor out and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails or the refresh call fails
    /// for a reason other than rejection.
    #[instrument(skip(self, shopper))]
    pub async fn authenticate(&self, shopper: &Shopper) -> Result<Option<Authenticated>, AuthError> {
        let (Some(user), Some(credentials)) = (shopper.user().await?, shopper.credentials().await?)
        else {
            return Ok(None);
        };

        let margin = chrono::Duration::seconds(REFRESH_MARGIN_SECONDS);
        if !credentials.expires_within(margin, Utc::now()) {
            return Ok(Some(Authenticated {
                user,
                access_token: credentials.access_token,
            }));
        }

        match self
            .client
            .auth()
            .refresh_session(&credentials.refresh_token)
            .await
        {
            Ok(session) => {
                let refreshed = PlatformCredentials::from(&session);
                let user = CurrentUser::from(session.user);
                shopper.set_credentials(&refreshed).await?;
                shopper.set_user(&user).await?;
                self.events
                    .publish(AuthEventKind::TokenRefreshed, Some(user.id));
                Ok(Some(Authenticated {
                    user,
                    access_token: refreshed.access_token,
                }))
            }
            Err(e) if e.is_rejection() => {
                tracing::info!(error = %e, "Refresh rejected; signing out");
                shopper.clear().await?;
                self.events.publish(AuthEventKind::SignedOut, Some(user.id));
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// [`authenticate`](Self::authenticate), then retry a guest cart merge
    /// that an earlier sign-in could not complete.
    ///
    /// # Errors
    ///
    /// See [`authenticate`](Self::authenticate).
    #[instrument(skip(self, shopper))]
    pub async fn current_session(&self, shopper: &Shopper) -> Result<Option<CurrentUser>, AuthError> {
        let Some(auth) = self.authenticate(shopper).await? else {
            return Ok(None);
        };
        self.reconcile_guest_cart(shopper, &auth.user, &auth.access_token)
            .await?;
        Ok(Some(auth.user))
    }

    // =========================================================================
    // Password / Profile
    // =========================================================================

    /// Email a password reset link that lands on `redirect_to`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or the platform's rejection.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str, redirect_to: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        self.client
            .auth()
            .reset_password_for_email(&email, redirect_to)
            .await?;
        self.events.publish(AuthEventKind::PasswordRecovery, None);
        Ok(())
    }

    /// Change the password of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword`, or the platform's rejection.
    #[instrument(skip(self, auth, password), fields(user_id = %auth.user.id))]
    pub async fn update_password(
        &self,
        auth: &Authenticated,
        password: &str,
    ) -> Result<(), AuthError> {
        validate_password(password)?;
        let attributes = UserAttributes {
            password: Some(password.to_string()),
            data: None,
        };
        self.client
            .auth()
            .update_user(&auth.access_token, &attributes)
            .await?;
        self.events
            .publish(AuthEventKind::UserUpdated, Some(auth.user.id));
        Ok(())
    }

    /// Save profile fields (`name`, optional `phone`) to the user metadata.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidName`, or the platform's rejection.
    #[instrument(skip(self, shopper, auth), fields(user_id = %auth.user.id))]
    pub async fn update_profile(
        &self,
        shopper: &Shopper,
        auth: &Authenticated,
        name: &str,
        phone: Option<&str>,
    ) -> Result<CurrentUser, AuthError> {
        let name = validate_name(name)?;
        let attributes = UserAttributes {
            password: None,
            data: Some(json!({ "name": name, "phone": phone.unwrap_or_default() })),
        };
        let updated = self
            .client
            .auth()
            .update_user(&auth.access_token, &attributes)
            .await?;

        let user = CurrentUser::from(updated);
        shopper.set_user(&user).await?;
        self.events.publish(AuthEventKind::UserUpdated, Some(user.id));
        Ok(user)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn begin_session(
        &self,
        shopper: &Shopper,
        session: &AuthSession,
    ) -> Result<CurrentUser, AuthError> {
        let user = CurrentUser::from(session.user.clone());
        let credentials = PlatformCredentials::from(session);
        shopper.establish(&user, &credentials).await?;

        self.reconcile_guest_cart(shopper, &user, &credentials.access_token)
            .await?;

        self.events.publish(AuthEventKind::SignedIn, Some(user.id));
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Hand a lingering guest cart to `user`.
    ///
    /// The guest id is retired only after rows actually moved. On failure it
    /// stays, so the next sign-in or session check tries again.
    async fn reconcile_guest_cart(
        &self,
        shopper: &Shopper,
        user: &CurrentUser,
        access_token: &str,
    ) -> Result<(), AuthError> {
        let Some(guest) = shopper.guest_session_id().await? else {
            return Ok(());
        };

        match CartService::new(self.client, Some(access_token))
            .merge_guest_cart(user.id, &guest)
            .await
        {
            Ok(MergeOutcome::Merged(_)) => shopper.retire_guest_session().await?,
            Ok(MergeOutcome::NothingToMerge) => {}
            Err(e) => {
                tracing::warn!(error = %e, guest = %guest, "Guest cart merge failed; will retry");
            }
        }
        Ok(())
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::WeakPassword("Password is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Check a password confirmation, when one was supplied.
///
/// # Errors
///
/// Returns `AuthError::PasswordMismatch` if the two differ.
pub fn validate_confirmation(password: &str, confirmation: Option<&str>) -> Result<(), AuthError> {
    match confirmation {
        Some(confirmation) if confirmation != password => Err(AuthError::PasswordMismatch),
        _ => Ok(()),
    }
}

/// Trim and check a display name.
///
/// # Errors
///
/// Returns `AuthError::InvalidName` if the trimmed name is empty or shorter
/// than [`MIN_NAME_LENGTH`].
pub fn validate_name(name: &str) -> Result<&str, AuthError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidName("Name is required".to_string()));
    }
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

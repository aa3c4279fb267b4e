//! Authentication error types.

use thiserror::Error;

use crate::middleware::shopper::SessionError;
use crate::platform::PlatformError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] greenbasket_core::EmailError),

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Display name missing or too short.
    #[error("{0}")]
    InvalidName(String),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// The platform rejected the call. Displays the platform's message.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Session store error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

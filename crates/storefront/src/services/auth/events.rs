//! Auth state change notifications.
//!
//! Services publish an [`AuthEvent`] whenever a visitor's auth state changes;
//! anything interested (the binary's audit listener, tests) subscribes.

use serde::Serialize;
use tokio::sync::broadcast;

use greenbasket_core::UserId;

/// Buffered events per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 64;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// A change in some visitor's auth state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// The affected user; `None` for recovery requests by email.
    pub user_id: Option<UserId>,
}

/// Publish/subscribe hub for [`AuthEvent`]s. Cheap to clone.
#[derive(Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Deliver `event` to every live subscription. With no subscribers the
    /// event is dropped.
    pub fn publish(&self, kind: AuthEventKind, user_id: Option<UserId>) {
        let event = AuthEvent { kind, user_id };
        tracing::debug!(?event, "Auth state changed");
        let _ = self.sender.send(event);
    }

    /// Start receiving events published from now on. Dropping the returned
    /// subscription unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }
}

/// A live subscription to [`AuthEvents`].
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Wait for the next event. Returns `None` once every publisher is gone.
    ///
    /// A subscriber that falls behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

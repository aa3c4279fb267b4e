//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::platform::{PlatformClient, PlatformError};
use crate::services::AuthEvents;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the platform client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    platform: PlatformClient,
    auth_events: AuthEvents,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, PlatformError> {
        let platform = PlatformClient::new(&config.platform)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                platform,
                auth_events: AuthEvents::new(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the platform client.
    #[must_use]
    pub fn platform(&self) -> &PlatformClient {
        &self.inner.platform
    }

    /// Get a reference to the auth event hub.
    #[must_use]
    pub fn auth_events(&self) -> &AuthEvents {
        &self.inner.auth_events
    }
}

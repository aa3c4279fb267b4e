//! CLI command implementations.
//!
//! Every command runs as the platform's service-role key, which bypasses row
//! security. Output goes through `tracing` at info level.

pub mod orders;
pub mod roles;
pub mod stats;
pub mod stock;

use secrecy::ExposeSecret;
use thiserror::Error;

use greenbasket_storefront::config::{ConfigError, PlatformConfig};
use greenbasket_storefront::platform::{PlatformClient, PlatformError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The service-role key is not configured.
    #[error("Missing environment variable: PLATFORM_SERVICE_ROLE_KEY")]
    MissingServiceKey,

    /// A platform call failed.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Build a platform client authenticated with the service-role key.
///
/// # Errors
///
/// Returns `CliError::Config` if the platform settings are missing or
/// invalid, or `CliError::MissingServiceKey` if no service-role key is set.
pub fn service_client() -> Result<PlatformClient, CliError> {
    dotenvy::dotenv().ok();

    let config = PlatformConfig::from_env()?;
    let key = config
        .service_role_key
        .as_ref()
        .ok_or(CliError::MissingServiceKey)?;

    tracing::debug!(platform = %config.url, "Using service-role client");
    Ok(PlatformClient::with_api_key(&config, key.expose_secret())?)
}

//! Role management commands.
//!
//! # Usage
//!
//! ```bash
//! gb-cli roles list
//! gb-cli roles grant -u <user-uuid> -r admin
//! ```

use greenbasket_core::{Role, UserId};
use greenbasket_storefront::platform::PlatformClient;
use greenbasket_storefront::services::AdminService;

use super::CliError;

/// Print every role assignment.
///
/// # Errors
///
/// Returns an error if the platform call fails.
pub async fn list(client: &PlatformClient) -> Result<(), CliError> {
    let roles = AdminService::new(client, None).list_user_roles().await?;

    if roles.is_empty() {
        tracing::info!("No role assignments");
        return Ok(());
    }

    for row in &roles {
        tracing::info!("  {}  {}", row.user_id, row.role);
    }
    tracing::info!("{} role assignment(s)", roles.len());
    Ok(())
}

/// Change a user's role.
///
/// # Errors
///
/// Returns an error if the user has no role row or the platform call fails.
pub async fn grant(client: &PlatformClient, user: UserId, role: &Role) -> Result<(), CliError> {
    let admin = AdminService::new(client, None);
    let previous = admin.get_user_role(user).await?;

    let updated = admin.update_user_role(user, role).await?;

    match previous {
        Some(previous) if previous.role != updated.role => {
            tracing::info!("Role changed: {} ({} -> {})", user, previous.role, updated.role);
        }
        _ => tracing::info!("Role set: {} ({})", user, updated.role),
    }
    Ok(())
}

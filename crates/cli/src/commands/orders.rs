//! Order management commands.

use greenbasket_core::{OrderId, OrderStatus};
use greenbasket_storefront::platform::PlatformClient;
use greenbasket_storefront::services::AdminService;

use super::CliError;

/// Set an order's status.
///
/// # Errors
///
/// Returns an error if the order does not exist or the platform call fails.
pub async fn set_status(
    client: &PlatformClient,
    order: OrderId,
    status: OrderStatus,
) -> Result<(), CliError> {
    let updated = AdminService::new(client, None)
        .update_order_status(order, status)
        .await?;

    tracing::info!(
        "Order {} is now {} (total {})",
        updated.id,
        updated.status,
        updated.total_amount
    );
    Ok(())
}

//! Dashboard numbers.

use greenbasket_storefront::platform::PlatformClient;
use greenbasket_storefront::services::AdminService;

use super::CliError;

/// Print product, order and category counts and total revenue.
///
/// # Errors
///
/// Returns an error if any of the platform calls fails.
pub async fn show(client: &PlatformClient) -> Result<(), CliError> {
    let stats = AdminService::new(client, None).dashboard_stats().await?;

    tracing::info!("Products:   {}", stats.total_products);
    tracing::info!("Orders:     {}", stats.total_orders);
    tracing::info!("Categories: {}", stats.total_categories);
    tracing::info!("Revenue:    {}", stats.total_revenue);
    Ok(())
}

//! Stock level commands.

use greenbasket_storefront::platform::PlatformClient;
use greenbasket_storefront::services::AdminService;

use super::CliError;

/// Print products at or below `threshold` units, lowest first.
///
/// # Errors
///
/// Returns an error if the platform call fails.
pub async fn low(client: &PlatformClient, threshold: i32) -> Result<(), CliError> {
    let products = AdminService::new(client, None)
        .low_stock_products(threshold)
        .await?;

    if products.is_empty() {
        tracing::info!("No products at or below {threshold} units");
        return Ok(());
    }

    for product in &products {
        let state = if product.is_active { "" } else { " (inactive)" };
        tracing::info!(
            "  {:>4}  {}  [{}]{}",
            product.stock_quantity,
            product.name,
            product.slug,
            state
        );
    }
    tracing::warn!("{} product(s) need restocking", products.len());
    Ok(())
}

//! Metrics for the instance type and price catalogs.

use metrics::{counter, gauge, histogram};

/// Catalog metrics recorder
pub struct CatalogMetrics;

impl CatalogMetrics {
    // =========================================================================
    // SKU Catalog
    // =========================================================================

    /// Record a successful raw SKU fetch
    pub fn record_sku_fetch(region: &str, count: usize, duration_secs: f64) {
        counter!("sku_catalog_fetches_total", "region" => region.to_string(), "status" => "success")
            .increment(1);
        histogram!("sku_catalog_fetch_duration_seconds", "region" => region.to_string())
            .record(duration_secs);
        gauge!("sku_catalog_skus", "region" => region.to_string()).set(count as f64);

        tracing::debug!(
            region = region,
            count = count,
            duration_secs = duration_secs,
            "Fetched SKU catalog"
        );
    }

    /// Record a failed raw SKU fetch
    pub fn record_sku_fetch_failed(region: &str) {
        counter!("sku_catalog_fetches_total", "region" => region.to_string(), "status" => "error")
            .increment(1);
    }

    /// Record a size string that did not parse
    pub fn record_size_parse_failure() {
        counter!("sku_size_parse_failures_total").increment(1);
    }

    // =========================================================================
    // Instance Types
    // =========================================================================

    /// Set the number of instance types produced by a list
    pub fn record_instance_types(region: &str, count: usize) {
        gauge!("instance_types_total", "region" => region.to_string()).set(count as f64);
    }

    /// Record a SKU dropped for having no offerings
    pub fn record_dropped_sku(region: &str) {
        counter!("instance_types_dropped_total", "region" => region.to_string()).increment(1);
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Record the outcome of a price refresh
    pub fn record_price_refresh(region: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        counter!("price_refreshes_total", "region" => region.to_string(), "status" => status)
            .increment(1);
    }

    /// Set the time of the last successful price update
    pub fn set_price_last_update(region: &str, unix_secs: i64) {
        gauge!("price_last_update_timestamp_seconds", "region" => region.to_string())
            .set(unix_secs as f64);
    }
}

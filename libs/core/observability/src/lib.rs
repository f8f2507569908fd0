//! Observability utilities for the instance type catalog.
//!
//! This crate provides:
//! - Prometheus metrics recorder installation and rendering
//! - Catalog-specific metric helpers (SKU fetches, offerings, price refreshes)
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder, so library
//! code can record unconditionally.
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, CatalogMetrics};
//!
//! init_metrics()?;
//! CatalogMetrics::record_instance_types("eastus", 312);
//! println!("{}", render_metrics());
//! ```

pub mod catalog;

pub use catalog::CatalogMetrics;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once; later calls return the same handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Prometheus text exposition of everything recorded so far
pub fn render_metrics() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // SKU catalog
    describe_counter!(
        "sku_catalog_fetches_total",
        "Raw SKU catalog fetches by region and status"
    );
    describe_histogram!(
        "sku_catalog_fetch_duration_seconds",
        "Raw SKU catalog fetch duration in seconds"
    );
    describe_gauge!(
        "sku_catalog_skus",
        "SKUs in the cached raw catalog by region"
    );
    describe_counter!(
        "sku_size_parse_failures_total",
        "SKU sizes that did not match the naming grammar"
    );

    // Instance types
    describe_gauge!(
        "instance_types_total",
        "Instance types produced by the last list by region"
    );
    describe_counter!(
        "instance_types_dropped_total",
        "SKUs dropped for having no purchasable offerings"
    );

    // Pricing
    describe_counter!(
        "price_refreshes_total",
        "On-demand price refreshes by region and status"
    );
    describe_gauge!(
        "price_last_update_timestamp_seconds",
        "Unix time of the last successful on-demand price update"
    );
}

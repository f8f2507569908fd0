//! Catalog Service
//!
//! Wires the SKU source, price catalog and availability cache into one
//! instance catalog for the configured region.

use chrono::{DateTime, Utc};
use domain_instancetype::labels::{RESOURCE_CPU, RESOURCE_MEMORY, RESOURCE_PODS};
use domain_instancetype::{
    InstanceCatalog, InstanceType, KubeletConfiguration, SkuSource, UnavailableOfferingsCache,
};
use domain_pricing::{AzureRetailPriceFeed, Clock, PriceFeed, PricingCatalog, PricingState, SystemClock};
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Status of the catalog service
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub region: String,
    pub pricing_state: PricingState,
    pub prices_last_updated: DateTime<Utc>,
    pub known_prices: usize,
    pub sku_cache_expires_at: Option<DateTime<Utc>>,
    pub instance_types: Option<usize>,
    pub is_healthy: bool,
}

/// One line of `list` output
#[derive(Debug, Clone, Serialize)]
pub struct InstanceTypeSummary {
    pub name: String,
    pub cpu: String,
    pub memory: String,
    pub pods: String,
    pub zones: usize,
    pub offerings: usize,
    pub on_demand_price: Option<f64>,
    pub cheapest_price: Option<f64>,
}

impl From<&InstanceType> for InstanceTypeSummary {
    fn from(it: &InstanceType) -> Self {
        let capacity = |name: &str| {
            it.capacity
                .get(name)
                .map(ToString::to_string)
                .unwrap_or_default()
        };
        let zones: std::collections::BTreeSet<_> = it.offerings.iter().map(|o| &o.zone).collect();

        Self {
            name: it.name.clone(),
            cpu: capacity(RESOURCE_CPU),
            memory: capacity(RESOURCE_MEMORY),
            pods: capacity(RESOURCE_PODS),
            zones: zones.len(),
            offerings: it.offerings.len(),
            on_demand_price: it
                .offerings
                .iter()
                .find(|o| o.available && o.capacity_type == domain_instancetype::CapacityType::OnDemand)
                .map(|o| o.price),
            cheapest_price: it.cheapest_offering().map(|o| o.price),
        }
    }
}

pub struct CatalogService {
    pricing: Arc<PricingCatalog>,
    unavailable: Arc<UnavailableOfferingsCache>,
    catalog: InstanceCatalog,
}

impl CatalogService {
    /// Build the service; runs the initial price fetch
    pub async fn new(config: &Config, sku_source: Arc<dyn SkuSource>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let feed: Arc<dyn PriceFeed> = Arc::new(AzureRetailPriceFeed::new(
            config.pricing_api_url.clone(),
            config.currency,
        ));

        info!(region = %config.region, currency = %config.currency, "Starting instance catalog");
        let pricing = PricingCatalog::new(config.region.clone(), feed, clock.clone()).await;
        let unavailable = Arc::new(UnavailableOfferingsCache::new(clock.clone()));

        let catalog = InstanceCatalog::new(
            config.region.clone(),
            sku_source,
            pricing.clone(),
            unavailable.clone(),
            clock,
        )
        .with_size_parse_ignore_list(config.size_parse_ignore_list.iter().cloned());

        Self {
            pricing,
            unavailable,
            catalog,
        }
    }

    pub fn pricing(&self) -> &Arc<PricingCatalog> {
        &self.pricing
    }

    pub async fn list(&self, kubelet: &KubeletConfiguration) -> Result<Vec<InstanceType>> {
        self.unavailable.purge_expired();
        let instance_types = self.catalog.list(kubelet).await?;
        Ok(instance_types)
    }

    /// Current state; lists once when `kubelet` is given
    pub async fn status(&self, kubelet: Option<&KubeletConfiguration>) -> Result<CatalogStatus> {
        let instance_types = match kubelet {
            Some(kubelet) => Some(self.list(kubelet).await?.len()),
            None => None,
        };

        Ok(CatalogStatus {
            region: self.catalog.region().to_string(),
            pricing_state: self.pricing.state().await,
            prices_last_updated: self.pricing.on_demand_last_updated().await,
            known_prices: self.pricing.instance_types().await.len(),
            sku_cache_expires_at: self.catalog.cache_expires_at().await,
            instance_types,
            is_healthy: self.catalog.liveness_probe().await.is_ok(),
        })
    }
}

/// Kubelet settings from a JSON file, or defaults
pub fn load_kubelet_config(path: Option<&Path>) -> Result<KubeletConfiguration> {
    let Some(path) = path else {
        return Ok(KubeletConfiguration::default());
    };
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read kubelet config {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("Failed to parse kubelet config {}", path.display()))
}

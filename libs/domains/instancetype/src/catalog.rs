//! Instance type catalog
//!
//! Raw SKUs are fetched once per [`INSTANCE_TYPES_CACHE_TTL`] and turned into
//! [`InstanceType`]s on every [`InstanceCatalog::list`]. The whole list runs
//! under one lock, so concurrent callers are served one at a time. A fetch
//! error fails the call; an expired entry is never served in its place.

use chrono::{DateTime, Duration, Utc};
use domain_pricing::{Clock, PricingCatalog};
use observability::CatalogMetrics;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;
use crate::error::{InstanceTypeError, InstanceTypeResult};
use crate::instance_type::InstanceType;
use crate::kubelet::KubeletConfiguration;
use crate::labels::DEFAULT_SIZE_PARSE_IGNORE_LIST;
use crate::models::RawSku;
use crate::offerings::{UnavailableOfferings, synthesize_offerings};
use crate::size::parse_size;
use crate::sku_source::SkuSource;

pub const INSTANCE_TYPES_CACHE_TTL: Duration = Duration::hours(23);

const CACHE_KEY_PREFIX: &str = "instance-types";

type SkuMap = Arc<BTreeMap<String, RawSku>>;

pub struct InstanceCatalog {
    region: String,
    cache_key: String,
    sku_source: Arc<dyn SkuSource>,
    pricing: Arc<PricingCatalog>,
    unavailable: Arc<dyn UnavailableOfferings>,
    size_parse_ignore_list: BTreeSet<String>,
    cache: Mutex<TtlCache<SkuMap>>,
}

impl InstanceCatalog {
    pub fn new(
        region: impl Into<String>,
        sku_source: Arc<dyn SkuSource>,
        pricing: Arc<PricingCatalog>,
        unavailable: Arc<dyn UnavailableOfferings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let region = region.into();
        Self {
            cache_key: format!("{CACHE_KEY_PREFIX}/{region}"),
            region,
            sku_source,
            pricing,
            unavailable,
            size_parse_ignore_list: DEFAULT_SIZE_PARSE_IGNORE_LIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache: Mutex::new(TtlCache::new(clock, INSTANCE_TYPES_CACHE_TTL)),
        }
    }

    /// Sizes whose parse failures are not logged
    pub fn with_size_parse_ignore_list<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.size_parse_ignore_list = sizes.into_iter().map(Into::into).collect();
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn pricing(&self) -> &Arc<PricingCatalog> {
        &self.pricing
    }

    /// Every purchasable instance type in the region.
    ///
    /// SKUs without a single offering are left out. Either the full list is
    /// returned or an error; never a partial catalog.
    pub async fn list(&self, kubelet: &KubeletConfiguration) -> InstanceTypeResult<Vec<InstanceType>> {
        let mut cache = self.cache.lock().await;

        let cached = cache.get(&self.cache_key).cloned();
        let skus = match cached {
            Some(skus) => skus,
            None => {
                let skus = self.fetch_skus().await?;
                cache.insert(self.cache_key.clone(), skus).clone()
            }
        };

        let mut instance_types = Vec::with_capacity(skus.len());
        for sku in skus.values() {
            let size = match parse_size(&sku.size) {
                Ok(size) => Some(size),
                Err(e) => {
                    CatalogMetrics::record_size_parse_failure();
                    if !self.size_parse_ignore_list.contains(&sku.size) {
                        warn!(sku = %sku.name, error = %e, "Failed to parse VM size");
                    }
                    None
                }
            };

            let offerings =
                synthesize_offerings(sku, &self.region, &self.pricing, self.unavailable.as_ref()).await;
            if offerings.is_empty() {
                debug!(sku = %sku.name, region = %self.region, "Dropping SKU without offerings");
                CatalogMetrics::record_dropped_sku(&self.region);
                continue;
            }

            instance_types.push(InstanceType::new(
                sku,
                size.as_ref(),
                &self.region,
                offerings,
                kubelet,
            )?);
        }

        CatalogMetrics::record_instance_types(&self.region, instance_types.len());
        Ok(instance_types)
    }

    /// Drop the cached SKUs so the next list refetches
    pub async fn invalidate(&self) {
        self.cache.lock().await.remove(&self.cache_key);
    }

    /// When the cached SKUs expire, if any are cached
    pub async fn cache_expires_at(&self) -> Option<DateTime<Utc>> {
        let cache = self.cache.lock().await;
        cache.get(&self.cache_key)?;
        cache.expires_at(&self.cache_key)
    }

    /// Take and release every lock, then check the price catalog
    pub async fn liveness_probe(&self) -> InstanceTypeResult<()> {
        drop(self.cache.lock().await);
        self.unavailable.liveness_probe();
        self.pricing.liveness_probe().await?;
        Ok(())
    }

    async fn fetch_skus(&self) -> InstanceTypeResult<SkuMap> {
        let started = Instant::now();
        let fetched = self.sku_source.list_skus(&self.region).await.map_err(|source| {
            CatalogMetrics::record_sku_fetch_failed(&self.region);
            InstanceTypeError::SkuSource {
                region: self.region.clone(),
                source,
            }
        })?;

        let skus: BTreeMap<String, RawSku> = fetched
            .into_iter()
            .filter(include_sku)
            .map(|sku| (sku.name.clone(), sku))
            .collect();

        CatalogMetrics::record_sku_fetch(&self.region, skus.len(), started.elapsed().as_secs_f64());
        info!(region = %self.region, count = skus.len(), "Discovered SKUs");
        Ok(Arc::new(skus))
    }
}

/// Which SKUs enter the catalog; currently all of them
fn include_sku(_sku: &RawSku) -> bool {
    true
}

//! Offering synthesis and the unavailable-offerings oracle.

use chrono::{DateTime, Duration, Utc};
use domain_pricing::{Clock, PricingCatalog};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::models::{CapacityType, Offering, RawSku};

/// Spot price as a fraction of the on-demand price
pub const SPOT_PRICE_FRACTION: f64 = 0.2;

/// How long a capacity error keeps an offering out of the catalog
pub const UNAVAILABLE_OFFERINGS_TTL: Duration = Duration::minutes(3);

/// Reports offerings that recently failed to launch
#[cfg_attr(test, mockall::automock)]
pub trait UnavailableOfferings: Send + Sync {
    fn is_unavailable(&self, sku: &str, region: &str, capacity_type: CapacityType) -> bool;

    /// Take and release any internal lock
    fn liveness_probe(&self) {}
}

type OfferingKey = (String, String, CapacityType);

/// In-memory [`UnavailableOfferings`] whose entries expire after a TTL
pub struct UnavailableOfferingsCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<OfferingKey, DateTime<Utc>>>,
}

impl UnavailableOfferingsCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: UNAVAILABLE_OFFERINGS_TTL,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Keep `(sku, region, capacity_type)` out of new catalogs until the TTL
    /// elapses
    pub fn mark_unavailable(&self, sku: &str, region: &str, capacity_type: CapacityType, reason: &str) {
        debug!(
            sku = sku,
            region = region,
            capacity_type = %capacity_type,
            reason = reason,
            "Marking offering unavailable"
        );
        let expires_at = self.clock.now() + self.ttl;
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((sku.to_string(), region.to_string(), capacity_type), expires_at);
    }

    /// Drop expired entries
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|_, expires_at| *expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UnavailableOfferings for UnavailableOfferingsCache {
    fn is_unavailable(&self, sku: &str, region: &str, capacity_type: CapacityType) -> bool {
        let key = (sku.to_string(), region.to_string(), capacity_type);
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .is_some_and(|expires_at| *expires_at > self.clock.now())
    }

    fn liveness_probe(&self) {
        drop(self.entries.lock().unwrap_or_else(|e| e.into_inner()));
    }
}

/// Region-qualified zone label value; non-zonal SKUs get the empty zone
pub fn qualified_zones(sku: &RawSku, region: &str) -> Vec<String> {
    let zones = sku.zones(region);
    if zones.is_empty() {
        return vec![String::new()];
    }
    zones.iter().map(|zone| format!("{region}-{zone}")).collect()
}

/// One offering per (zone, capacity type) that the oracle does not exclude.
///
/// `available` reflects only whether the price catalog knows the SKU.
pub async fn synthesize_offerings(
    sku: &RawSku,
    region: &str,
    pricing: &PricingCatalog,
    unavailable: &dyn UnavailableOfferings,
) -> Vec<Offering> {
    let on_demand = pricing.on_demand_price(&sku.name).await;
    let available = on_demand.is_some();
    let on_demand = on_demand.unwrap_or_default();

    let mut offerings = Vec::new();
    for zone in qualified_zones(sku, region) {
        for capacity_type in CapacityType::iter() {
            if unavailable.is_unavailable(&sku.name, region, capacity_type) {
                continue;
            }
            let price = match capacity_type {
                CapacityType::OnDemand => on_demand,
                CapacityType::Spot => on_demand * SPOT_PRICE_FRACTION,
            };
            offerings.push(Offering {
                zone: zone.clone(),
                capacity_type,
                price,
                available,
            });
        }
    }
    offerings
}

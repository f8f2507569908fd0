//! On-demand price catalog
//!
//! Seeded from the static tables on construction so lookups never wait on the
//! network, then refreshed from a [`PriceFeed`] once at startup and every
//! [`PRICING_REFRESH_PERIOD`] after the process becomes active. A failed
//! refresh keeps the previous map and its timestamp.

use chrono::{DateTime, Utc};
use observability::CatalogMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::PricingResult;
use crate::feed::PriceFeed;
use crate::models::{PriceMap, PricingSnapshot, PricingState};
use crate::static_prices::{has_static_prices, static_prices, REFERENCE_REGION};

/// Interval between background refreshes
pub const PRICING_REFRESH_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

/// Region-scoped price catalog shared by every offering lookup
pub struct PricingCatalog {
    region: String,
    feed: Arc<dyn PriceFeed>,
    clock: Arc<dyn Clock>,
    refresh_period: Duration,
    snapshot: RwLock<PricingSnapshot>,
}

impl PricingCatalog {
    /// Seed from the static table and run the initial fetch.
    ///
    /// The initial fetch happens regardless of leadership; its failure only
    /// leaves the catalog seeded.
    pub async fn new(
        region: impl Into<String>,
        feed: Arc<dyn PriceFeed>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let catalog = Arc::new(Self::seeded(region, feed, clock));
        catalog.refresh().await;
        catalog
    }

    /// Seed from the static table without touching the feed
    pub fn seeded(
        region: impl Into<String>,
        feed: Arc<dyn PriceFeed>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let region = region.into();
        if !has_static_prices(&region) {
            info!(
                region = %region,
                fallback = REFERENCE_REGION,
                "No static prices for region, seeding from reference region"
            );
        }
        let snapshot = PricingSnapshot::seeded(static_prices(&region), clock.now());

        Self {
            region,
            feed,
            clock,
            refresh_period: PRICING_REFRESH_PERIOD,
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Override the refresh period
    pub fn with_refresh_period(mut self, period: Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Hourly on-demand price; `None` when the catalog has no entry
    pub async fn on_demand_price(&self, instance_type: &str) -> Option<f64> {
        self.snapshot.read().await.prices.get(instance_type).copied()
    }

    /// Time of the last successful update (or of seeding)
    pub async fn on_demand_last_updated(&self) -> DateTime<Utc> {
        self.snapshot.read().await.last_update_time
    }

    /// Instance type names with a known price
    pub async fn instance_types(&self) -> Vec<String> {
        self.snapshot.read().await.prices.keys().cloned().collect()
    }

    pub async fn state(&self) -> PricingState {
        self.snapshot.read().await.state
    }

    /// Fetch from the feed and swap the whole map in one write.
    ///
    /// On error the previous map and timestamp stay in place.
    pub async fn update_on_demand_pricing(&self) -> PricingResult<()> {
        let fetched = match self.feed.fetch_on_demand_prices(&self.region).await {
            Ok(prices) => prices,
            Err(e) => {
                let mut snapshot = self.snapshot.write().await;
                if snapshot.state == PricingState::Live {
                    snapshot.state = PricingState::Stale;
                }
                return Err(e);
            }
        };

        let count = fetched.len();
        let changed = self.swap(fetched).await;
        if changed {
            info!(region = %self.region, count = count, "Updated on-demand prices");
        } else {
            debug!(region = %self.region, count = count, "On-demand prices unchanged");
        }
        Ok(())
    }

    async fn swap(&self, prices: PriceMap) -> bool {
        let now = self.clock.now();
        let mut snapshot = self.snapshot.write().await;
        let changed = snapshot.prices != prices;
        snapshot.prices = prices;
        snapshot.last_update_time = now;
        snapshot.state = PricingState::Live;
        CatalogMetrics::set_price_last_update(&self.region, now.timestamp());
        changed
    }

    /// Update and log the outcome; never fails
    pub async fn refresh(&self) {
        match self.update_on_demand_pricing().await {
            Ok(()) => CatalogMetrics::record_price_refresh(&self.region, true),
            Err(e) => {
                CatalogMetrics::record_price_refresh(&self.region, false);
                let last_updated = self.on_demand_last_updated().await;
                error!(
                    region = %self.region,
                    error = %e,
                    last_updated = %last_updated,
                    "Failed to update on-demand prices, keeping previous prices"
                );
            }
        }
    }

    /// Drop live data and reseed from the static table
    pub async fn reset(&self) {
        let seeded = PricingSnapshot::seeded(static_prices(&self.region), self.clock.now());
        *self.snapshot.write().await = seeded;
        info!(region = %self.region, "Reset prices to static table");
    }

    /// Acquire and release the snapshot lock
    pub async fn liveness_probe(&self) -> PricingResult<()> {
        drop(self.snapshot.read().await);
        Ok(())
    }

    /// Background refresh loop.
    ///
    /// Waits until `elected` turns true, catches up immediately if the wait
    /// outlasted one refresh period, then refreshes every period until
    /// `cancel` fires. Failed refreshes wait for the next tick.
    pub async fn run(self: Arc<Self>, mut elected: watch::Receiver<bool>, cancel: CancellationToken) {
        let waiting_since = self.clock.now();

        tokio::select! {
            _ = cancel.cancelled() => {
                info!(region = %self.region, "Price refresh cancelled before activation");
                return;
            }
            result = async { elected.wait_for(|active| *active).await.map(|_| ()) } => {
                if result.is_err() {
                    warn!(region = %self.region, "Activation signal dropped, price refresh not started");
                    return;
                }
            }
        }

        let waited = self.clock.now() - waiting_since;
        let period = chrono::Duration::from_std(self.refresh_period).unwrap_or(chrono::Duration::MAX);
        if waited > period {
            debug!(
                region = %self.region,
                waited_secs = waited.num_seconds(),
                "Activation took longer than a refresh period, refreshing now"
            );
            self.refresh().await;
        }

        info!(
            region = %self.region,
            period_secs = self.refresh_period.as_secs(),
            "Starting periodic price refresh"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(region = %self.region, "Price refresh stopped");
                    break;
                }
                _ = tokio::time::sleep(self.refresh_period) => {
                    self.refresh().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::PricingError;
    use crate::feed::MockPriceFeed;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn prices(entries: &[(&str, f64)]) -> PriceMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    /// Feed that counts calls and always answers with the same map
    struct CountingFeed {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PriceFeed for CountingFeed {
        async fn fetch_on_demand_prices(&self, _region: &str) -> PricingResult<PriceMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(prices(&[("Standard_D2s_v3", 0.1)]))
        }
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    #[tokio::test]
    async fn test_seeded_before_fetch() {
        let feed = MockPriceFeed::new();
        let catalog = PricingCatalog::seeded("westeurope", Arc::new(feed), Arc::new(ManualClock::default()));

        assert_eq!(catalog.state().await, PricingState::Seeded);
        assert_eq!(catalog.on_demand_price("Standard_D2s_v3").await, Some(0.111));
        assert_eq!(catalog.on_demand_price("Standard_Nope").await, None);
    }

    #[tokio::test]
    async fn test_initial_fetch_replaces_static_table() {
        let mut feed = MockPriceFeed::new();
        feed.expect_fetch_on_demand_prices()
            .withf(|region| region.to_string() == "eastus")
            .times(1)
            .returning(|_| Ok(prices(&[("Standard_X1", 1.5)])));

        let catalog = PricingCatalog::new("eastus", Arc::new(feed), Arc::new(ManualClock::default())).await;

        assert_eq!(catalog.state().await, PricingState::Live);
        assert_eq!(catalog.on_demand_price("Standard_X1").await, Some(1.5));
        // Whole map replaced, static entries gone
        assert_eq!(catalog.on_demand_price("Standard_D2s_v3").await, None);
        assert_eq!(catalog.instance_types().await, vec!["Standard_X1".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_prices_and_timestamp() {
        let clock = Arc::new(ManualClock::default());
        let mut feed = MockPriceFeed::new();
        let mut seq = mockall::Sequence::new();
        feed.expect_fetch_on_demand_prices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(prices(&[("Standard_X1", 1.5)])));
        feed.expect_fetch_on_demand_prices()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|region| Err(PricingError::Empty(region.to_string())));

        let catalog = PricingCatalog::new("eastus", Arc::new(feed), clock.clone()).await;
        let updated = catalog.on_demand_last_updated().await;

        clock.advance(chrono::Duration::hours(12));
        assert!(catalog.update_on_demand_pricing().await.is_err());

        assert_eq!(catalog.on_demand_price("Standard_X1").await, Some(1.5));
        assert_eq!(catalog.on_demand_last_updated().await, updated);
        assert_eq!(catalog.state().await, PricingState::Stale);
    }

    #[tokio::test]
    async fn test_failed_initial_fetch_stays_seeded() {
        let mut feed = MockPriceFeed::new();
        feed.expect_fetch_on_demand_prices()
            .returning(|region| Err(PricingError::Empty(region.to_string())));

        let catalog = PricingCatalog::new("eastus", Arc::new(feed), Arc::new(ManualClock::default())).await;

        assert_eq!(catalog.state().await, PricingState::Seeded);
        assert_eq!(catalog.on_demand_price("Standard_D2s_v3").await, Some(0.096));
    }

    #[tokio::test]
    async fn test_reset_reseeds() {
        let mut feed = MockPriceFeed::new();
        feed.expect_fetch_on_demand_prices()
            .returning(|_| Ok(prices(&[("Standard_X1", 1.5)])));

        let catalog = PricingCatalog::new("eastus", Arc::new(feed), Arc::new(ManualClock::default())).await;
        catalog.reset().await;

        assert_eq!(catalog.state().await, PricingState::Seeded);
        assert_eq!(catalog.on_demand_price("Standard_X1").await, None);
        assert!(catalog.liveness_probe().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_activation_then_ticks() {
        let feed = Arc::new(CountingFeed { calls: AtomicUsize::new(0) });
        let clock = Arc::new(ManualClock::default());
        let catalog = PricingCatalog::new("eastus", feed.clone(), clock.clone()).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        let (elected_tx, elected_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(catalog.clone().run(elected_rx, cancel.clone()));

        // Not active yet: a full period passes without a fetch
        tokio::time::advance(PRICING_REFRESH_PERIOD).await;
        settle().await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        // Activation within one period: no catch-up fetch
        elected_tx.send(true).unwrap();
        settle().await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(PRICING_REFRESH_PERIOD).await;
        settle().await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_catches_up_after_long_wait() {
        let feed = Arc::new(CountingFeed { calls: AtomicUsize::new(0) });
        let clock = Arc::new(ManualClock::default());
        let catalog = PricingCatalog::new("eastus", feed.clone(), clock.clone()).await;

        let (elected_tx, elected_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(catalog.clone().run(elected_rx, cancel.clone()));
        settle().await;

        clock.advance(chrono::Duration::hours(13));
        elected_tx.send(true).unwrap();
        settle().await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_cancelled_before_activation() {
        let feed = Arc::new(CountingFeed { calls: AtomicUsize::new(0) });
        let catalog = PricingCatalog::new("eastus", feed.clone(), Arc::new(ManualClock::default())).await;

        let (_elected_tx, elected_rx) = watch::channel(false);
        let cancel = CancellationToken::new();
        cancel.cancel();
        catalog.run(elected_rx, cancel).await;

        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }
}

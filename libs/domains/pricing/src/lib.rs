//! Pricing Domain
//!
//! On-demand VM prices for a single region, kept fresh in the background.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐
//! │ PricingCatalog │  ← RwLock'd snapshot, 12h refresh loop, liveness
//! └───────┬────────┘
//!         │
//! ┌───────▼────────┐   ┌───────────────┐
//! │   PriceFeed    │   │ static tables │  ← seed / fallback
//! └────────────────┘   └───────────────┘
//! ```

pub mod catalog;
pub mod clock;
pub mod error;
pub mod feed;
pub mod models;
pub mod static_prices;

// Re-export commonly used types
pub use catalog::{PRICING_REFRESH_PERIOD, PricingCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PricingError, PricingResult};
pub use feed::{AzureRetailPriceFeed, PriceFeed, RETAIL_PRICES_API};
pub use models::{Currency, PriceMap, PriceQuery, PricingSnapshot, PricingState};
pub use static_prices::{REFERENCE_REGION, static_prices};

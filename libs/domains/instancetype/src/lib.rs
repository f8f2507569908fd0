//! Instance Type Domain
//!
//! Turns raw VM SKU descriptors into instance types a scheduler can reason
//! about: a requirement set, a capacity vector, reservation overhead and a
//! list of priced offerings.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ InstanceCatalog │  ← TTL cache of raw SKUs, one lock per list
//! └────────┬────────┘
//!          │ per SKU
//!   ┌──────┴───────┬────────────────┬──────────────────┐
//!   ▼              ▼                ▼                  ▼
//! size parser  capabilities     resources          offerings
//!              (requirements)   (capacity,         (PricingCatalog,
//!                               overhead)           availability)
//! ```
//!
//! The SKU list itself comes from a [`SkuSource`].

pub mod cache;
pub mod capabilities;
pub mod catalog;
pub mod error;
pub mod instance_type;
pub mod kubelet;
pub mod labels;
pub mod models;
pub mod offerings;
pub mod quantity;
pub mod requirements;
pub mod resources;
pub mod size;
pub mod sku_source;

// Re-export commonly used types
pub use cache::TtlCache;
pub use capabilities::compute_requirements;
pub use catalog::{INSTANCE_TYPES_CACHE_TTL, InstanceCatalog};
pub use error::{
    InstanceTypeError, InstanceTypeResult, QuantityParseError, SizeParseError, SkuSourceError,
};
pub use instance_type::{InstanceType, Overhead};
pub use kubelet::KubeletConfiguration;
pub use models::{CapacityType, Offering, RawSku, SkuCapability};
pub use offerings::{
    SPOT_PRICE_FRACTION, UnavailableOfferings, UnavailableOfferingsCache, synthesize_offerings,
};
pub use quantity::{Quantity, ResourceList};
pub use requirements::{Operator, Requirement, Requirements};
pub use resources::{compute_capacity, compute_overhead};
pub use size::{ParsedSize, parse_size};
pub use sku_source::{SkuSource, StaticSkuSource};

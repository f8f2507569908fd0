use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Capability names reported on a raw SKU
pub mod capability {
    pub const VCPUS: &str = "vCPUs";
    pub const VCPUS_AVAILABLE: &str = "vCPUsAvailable";
    pub const MEMORY_GB: &str = "MemoryGB";
    pub const GPUS: &str = "GPUs";
    pub const CPU_ARCHITECTURE_TYPE: &str = "CpuArchitectureType";
    pub const PREMIUM_IO: &str = "PremiumIO";
    pub const ENCRYPTION_AT_HOST: &str = "EncryptionAtHostSupported";
    pub const ACCELERATED_NETWORKING: &str = "AcceleratedNetworkingEnabled";
    pub const EPHEMERAL_OS_DISK: &str = "EphemeralOSDiskSupported";
    pub const HYPERV_GENERATIONS: &str = "HyperVGenerations";
    pub const CACHED_DISK_BYTES: &str = "CachedDiskBytes";
    pub const MAX_RESOURCE_VOLUME_MB: &str = "MaxResourceVolumeMB";
}

/// One name/value pair from a SKU's capability bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuCapability {
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Vendor descriptor for one VM size, as returned by the SKU source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSku {
    /// e.g. `Standard_D2s_v3`
    pub name: String,
    /// e.g. `D2s_v3`
    pub size: String,
    #[serde(default)]
    pub capabilities: Vec<SkuCapability>,
    /// Region → zone identifiers (`"1"`, `"2"`, ...)
    #[serde(default)]
    pub zones: BTreeMap<String, Vec<String>>,
}

impl RawSku {
    pub fn new(name: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
            capabilities: Vec::new(),
            zones: BTreeMap::new(),
        }
    }

    pub fn with_capability(mut self, name: &str, value: &str) -> Self {
        self.capabilities.push(SkuCapability {
            name: name.to_string(),
            value: Some(value.to_string()),
        });
        self
    }

    pub fn with_zones(mut self, region: &str, zones: &[&str]) -> Self {
        self.zones.insert(
            region.to_string(),
            zones.iter().map(|z| z.to_string()).collect(),
        );
        self
    }

    /// First value reported for `name`; a capability without a value counts
    /// as missing
    pub fn capability(&self, name: &str) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.value.as_deref())
    }

    /// `true` only when the capability is present and reads `True`
    pub fn bool_capability(&self, name: &str) -> bool {
        self.capability(name)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    pub fn int_capability(&self, name: &str) -> Option<i64> {
        self.capability(name)?.trim().parse().ok()
    }

    pub fn decimal_capability(&self, name: &str) -> Option<Decimal> {
        Decimal::from_str(self.capability(name)?.trim()).ok()
    }

    /// Zones this SKU is offered in within `region`
    pub fn zones(&self, region: &str) -> &[String] {
        self.zones.get(region).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Purchasing tier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CapacityType {
    OnDemand,
    Spot,
}

/// A purchasable (zone, capacity type) combination of one instance type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Region-qualified zone (`eastus-1`); empty when the SKU is not zonal
    pub zone: String,
    pub capacity_type: CapacityType,
    pub price: f64,
    /// A live on-demand price was found
    pub available: bool,
}

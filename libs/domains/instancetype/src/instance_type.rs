use serde::Serialize;

use crate::capabilities::compute_requirements;
use crate::error::InstanceTypeResult;
use crate::kubelet::KubeletConfiguration;
use crate::models::{Offering, RawSku};
use crate::quantity::{ResourceList, merge_sum};
use crate::requirements::Requirements;
use crate::resources::{compute_capacity, compute_overhead};
use crate::size::ParsedSize;

/// Resources withheld from workloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overhead {
    pub kube_reserved: ResourceList,
    pub system_reserved: ResourceList,
    pub eviction_threshold: ResourceList,
}

impl Overhead {
    pub fn total(&self) -> ResourceList {
        merge_sum([
            &self.kube_reserved,
            &self.system_reserved,
            &self.eviction_threshold,
        ])
    }
}

/// A schedulable machine type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceType {
    pub name: String,
    pub requirements: Requirements,
    pub capacity: ResourceList,
    pub overhead: Overhead,
    pub offerings: Vec<Offering>,
}

impl InstanceType {
    /// Assemble an instance type from a SKU and its already synthesized
    /// offerings. Deterministic for the same inputs.
    pub fn new(
        sku: &RawSku,
        size: Option<&ParsedSize>,
        region: &str,
        offerings: Vec<Offering>,
        kubelet: &KubeletConfiguration,
    ) -> InstanceTypeResult<Self> {
        let capacity = compute_capacity(sku, kubelet)?;
        let overhead = compute_overhead(&capacity, kubelet)?;
        let requirements = compute_requirements(sku, size, region, &offerings, &capacity);

        Ok(Self {
            name: sku.name.clone(),
            requirements,
            capacity,
            overhead,
            offerings,
        })
    }

    /// Capacity less total overhead, per capacity resource
    pub fn allocatable(&self) -> ResourceList {
        let overhead = self.overhead.total();
        self.capacity
            .iter()
            .map(|(name, quantity)| {
                let reserved = overhead.get(name).copied().unwrap_or_default();
                (name.clone(), quantity.saturating_sub(reserved))
            })
            .collect()
    }

    /// Cheapest available offering
    pub fn cheapest_offering(&self) -> Option<&Offering> {
        self.offerings
            .iter()
            .filter(|o| o.available)
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::*;
    use crate::models::{CapacityType, capability};
    use crate::quantity::Quantity;
    use crate::size::parse_size;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    fn d2s_v3() -> RawSku {
        RawSku::new("Standard_D2s_v3", "D2s_v3")
            .with_capability(capability::VCPUS, "2")
            .with_capability(capability::MEMORY_GB, "8")
            .with_capability(capability::PREMIUM_IO, "True")
    }

    fn offerings() -> Vec<Offering> {
        vec![
            Offering {
                zone: "eastus-1".into(),
                capacity_type: CapacityType::OnDemand,
                price: 0.096,
                available: true,
            },
            Offering {
                zone: "eastus-1".into(),
                capacity_type: CapacityType::Spot,
                price: 0.0192,
                available: true,
            },
        ]
    }

    fn build(kubelet: &KubeletConfiguration) -> InstanceType {
        let sku = d2s_v3();
        let size = parse_size(&sku.size).ok();
        InstanceType::new(&sku, size.as_ref(), "eastus", offerings(), kubelet).unwrap()
    }

    #[test]
    fn test_new_assembles_all_parts() {
        let it = build(&KubeletConfiguration::default());
        assert_eq!(it.name, "Standard_D2s_v3");
        assert_eq!(it.capacity[RESOURCE_CPU], q("2"));
        assert_eq!(it.overhead.kube_reserved[RESOURCE_MEMORY], q("1465Mi"));
        assert!(it.requirements.has(LABEL_SKU_SERIES));
        assert_eq!(it.offerings.len(), 2);
    }

    #[test]
    fn test_overhead_total_and_allocatable() {
        let it = build(&KubeletConfiguration::default());
        let total = it.overhead.total();
        // 70m kube + 100m system
        assert_eq!(total[RESOURCE_CPU], q("170m"));
        // 1465Mi kube + 100Mi system + 100Mi eviction
        assert_eq!(total[RESOURCE_MEMORY], q("1665Mi"));

        let allocatable = it.allocatable();
        assert_eq!(allocatable[RESOURCE_CPU], q("1830m"));
        assert_eq!(allocatable[RESOURCE_PODS], q("110"));
    }

    #[test]
    fn test_idempotent() {
        let kubelet = KubeletConfiguration::default()
            .with_max_pods(50)
            .with_eviction_hard("memory.available", "5%");
        let first = serde_json::to_string(&build(&kubelet)).unwrap();
        let second = serde_json::to_string(&build(&kubelet)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_kubelet_config_fails() {
        let kubelet = KubeletConfiguration::default().with_eviction_hard("memory.available", "x%");
        let sku = d2s_v3();
        assert!(InstanceType::new(&sku, None, "eastus", offerings(), &kubelet).is_err());
    }

    #[test]
    fn test_cheapest_offering() {
        let it = build(&KubeletConfiguration::default());
        assert_eq!(it.cheapest_offering().unwrap().capacity_type, CapacityType::Spot);
    }
}

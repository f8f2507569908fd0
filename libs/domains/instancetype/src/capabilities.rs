//! Requirement set for one SKU, built from its name, capability bag and
//! offerings.

use std::collections::BTreeSet;
use tracing::debug;

use crate::labels::*;
use crate::models::{Offering, RawSku, capability};
use crate::quantity::ResourceList;
use crate::requirements::{Requirement, Requirements};
use crate::size::ParsedSize;

const MIB: i64 = 1024 * 1024;

/// Build the requirement set for `sku`.
///
/// `size` is `None` when the size name did not parse; identity and additive
/// keys are then left as `DoesNotExist`. Capability misses never fail: a
/// missing or malformed capability leaves its key absent.
pub fn compute_requirements(
    sku: &RawSku,
    size: Option<&ParsedSize>,
    region: &str,
    offerings: &[Offering],
    capacity: &ResourceList,
) -> Requirements {
    let mut requirements: Requirements = FEATURE_KEYS
        .iter()
        .map(|key| Requirement::does_not_exist(key))
        .collect();

    add_fixed(&mut requirements, sku, region, offerings, capacity);

    if let Some(size) = size {
        add_identity(&mut requirements, size);
        add_additive_features(&mut requirements, sku, size);
    }

    add_capability_features(&mut requirements, sku, size);

    requirements
}

fn add_fixed(
    requirements: &mut Requirements,
    sku: &RawSku,
    region: &str,
    offerings: &[Offering],
    capacity: &ResourceList,
) {
    let architecture = sku
        .capability(capability::CPU_ARCHITECTURE_TYPE)
        .map(|vendor| architecture_alias(vendor).unwrap_or(vendor))
        .unwrap_or(DEFAULT_ARCHITECTURE);

    let zones: BTreeSet<&str> = offerings.iter().map(|o| o.zone.as_str()).collect();
    let capacity_types: BTreeSet<&str> = offerings.iter().map(|o| o.capacity_type.as_ref()).collect();

    requirements.add(Requirement::single(LABEL_INSTANCE_TYPE, &sku.name));
    requirements.add(Requirement::single(LABEL_SKU_NAME, &sku.name));
    requirements.add(Requirement::single(LABEL_ARCH, architecture));
    requirements.add(Requirement::single(LABEL_OS, OS_LINUX));
    requirements.add(Requirement::in_values(LABEL_TOPOLOGY_ZONE, zones));
    requirements.add(Requirement::single(LABEL_TOPOLOGY_REGION, region));
    requirements.add(Requirement::in_values(LABEL_CAPACITY_TYPE, capacity_types));

    if let Some(cpu) = capacity.get(RESOURCE_CPU) {
        requirements.add(Requirement::single(LABEL_SKU_CPU, cpu.value().to_string()));
    }
    if let Some(memory) = capacity.get(RESOURCE_MEMORY) {
        let mib = memory.value() / MIB;
        requirements.add(Requirement::single(LABEL_SKU_MEMORY, mib.to_string()));
    }
}

fn add_identity(requirements: &mut Requirements, size: &ParsedSize) {
    requirements.add(Requirement::single(LABEL_SKU_SERIES, size.series()));
    requirements.add(Requirement::single(LABEL_SKU_FAMILY, size.family.to_string()));

    if let Some(subfamily) = size.subfamily {
        requirements.add(Requirement::single(LABEL_SKU_SUBFAMILY, subfamily.to_string()));
    }
    if let Some(constrained) = size.constrained_vcpus {
        requirements.add(Requirement::single(
            LABEL_SKU_CPU_CONSTRAINED,
            constrained.to_string(),
        ));
    }
    if !size.version.is_empty() {
        requirements.add(Requirement::single(LABEL_SKU_VERSION, &size.version));
    }
    if let Some(accelerator) = &size.accelerator {
        requirements.add(Requirement::single(LABEL_SKU_ACCELERATOR, accelerator));
    }
}

fn add_additive_features(requirements: &mut Requirements, sku: &RawSku, size: &ParsedSize) {
    for feature in &size.additive_features {
        if let Some(key) = additive_feature_key(feature) {
            requirements.set(Requirement::single(key, FEATURE_PRESENT));
        } else if !IGNORED_ADDITIVE_FEATURES.contains(&feature.as_str()) {
            debug!(sku = %sku.name, feature = %feature, "Unknown additive feature");
        }
    }
}

fn add_capability_features(requirements: &mut Requirements, sku: &RawSku, size: Option<&ParsedSize>) {
    let flags = [
        (capability::PREMIUM_IO, LABEL_SKU_STORAGE_PREMIUM_CAPABLE),
        (capability::ENCRYPTION_AT_HOST, LABEL_SKU_ENCRYPTION_AT_HOST),
        (capability::ACCELERATED_NETWORKING, LABEL_SKU_NETWORKING_ACCELERATED),
    ];
    for (name, key) in flags {
        if sku.bool_capability(name) {
            requirements.set(Requirement::single(key, FEATURE_PRESENT));
        }
    }

    let ephemeral_unsupported = size.is_some_and(|s| {
        EPHEMERAL_OS_DISK_UNSUPPORTED_SERIES.contains(&s.series().as_str())
    });
    if sku.bool_capability(capability::EPHEMERAL_OS_DISK) && !ephemeral_unsupported {
        requirements.set(Requirement::single(LABEL_SKU_STORAGE_EPHEMERAL_OS, FEATURE_PRESENT));
    }

    // Comma-separated, e.g. "V1,V2"
    if let Some(generations) = sku.capability(capability::HYPERV_GENERATIONS) {
        for generation in generations.split(',').map(str::trim).filter(|g| !g.is_empty()) {
            requirements.insert_value(LABEL_SKU_HYPERV_GENERATION, generation);
        }
    }

    let sizes = [
        (capability::CACHED_DISK_BYTES, LABEL_SKU_STORAGE_CACHED_DISK_BYTES),
        (capability::MAX_RESOURCE_VOLUME_MB, LABEL_SKU_STORAGE_RESOURCE_VOLUME_MB),
    ];
    for (name, key) in sizes {
        if let Some(value) = sku.int_capability(name) {
            requirements.set(Requirement::single(key, value.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CapacityType;
    use crate::quantity::Quantity;
    use crate::requirements::Operator;
    use crate::size::parse_size;

    fn offering(zone: &str, capacity_type: CapacityType) -> Offering {
        Offering {
            zone: zone.to_string(),
            capacity_type,
            price: 0.1,
            available: true,
        }
    }

    fn values(reqs: &Requirements, key: &str) -> Vec<String> {
        reqs.get(key).unwrap().values.iter().cloned().collect()
    }

    fn operator(reqs: &Requirements, key: &str) -> Operator {
        reqs.get(key).unwrap().operator
    }

    fn nv16() -> RawSku {
        RawSku::new("Standard_NV16as_v4", "NV16as_v4")
            .with_capability(capability::VCPUS, "16")
            .with_capability(capability::MEMORY_GB, "56")
            .with_capability(capability::CPU_ARCHITECTURE_TYPE, "x64")
            .with_capability(capability::PREMIUM_IO, "True")
            .with_capability(capability::ACCELERATED_NETWORKING, "True")
            .with_capability(capability::ENCRYPTION_AT_HOST, "False")
            .with_capability(capability::EPHEMERAL_OS_DISK, "True")
            .with_capability(capability::HYPERV_GENERATIONS, "V1,V2")
            .with_capability(capability::CACHED_DISK_BYTES, "429496729600")
            .with_capability(capability::MAX_RESOURCE_VOLUME_MB, "360448")
    }

    fn build(sku: &RawSku, offerings: &[Offering]) -> Requirements {
        let size = parse_size(&sku.size).ok();
        let capacity = ResourceList::from([
            (RESOURCE_CPU.to_string(), Quantity::from_units(16)),
            (RESOURCE_MEMORY.to_string(), Quantity::gibibytes(56)),
        ]);
        compute_requirements(sku, size.as_ref(), "eastus", offerings, &capacity)
    }

    #[test]
    fn test_every_feature_key_present() {
        let reqs = build(&RawSku::new("Standard_A1", "A1"), &[]);
        for key in FEATURE_KEYS {
            assert_eq!(operator(&reqs, key), Operator::DoesNotExist, "{key}");
        }
    }

    #[test]
    fn test_fixed_requirements() {
        let offerings = [
            offering("eastus-1", CapacityType::OnDemand),
            offering("eastus-2", CapacityType::OnDemand),
            offering("eastus-1", CapacityType::Spot),
        ];
        let reqs = build(&nv16(), &offerings);

        assert_eq!(values(&reqs, LABEL_INSTANCE_TYPE), ["Standard_NV16as_v4"]);
        assert_eq!(values(&reqs, LABEL_ARCH), ["amd64"]);
        assert_eq!(values(&reqs, LABEL_OS), ["linux"]);
        assert_eq!(values(&reqs, LABEL_TOPOLOGY_REGION), ["eastus"]);
        assert_eq!(values(&reqs, LABEL_TOPOLOGY_ZONE), ["eastus-1", "eastus-2"]);
        assert_eq!(values(&reqs, LABEL_CAPACITY_TYPE), ["on-demand", "spot"]);
        assert_eq!(values(&reqs, LABEL_SKU_CPU), ["16"]);
        assert_eq!(values(&reqs, LABEL_SKU_MEMORY), ["57344"]);
    }

    #[test]
    fn test_identity_and_additive_features() {
        let reqs = build(&nv16(), &[]);
        assert_eq!(values(&reqs, LABEL_SKU_SERIES), ["NVas_v4"]);
        assert_eq!(values(&reqs, LABEL_SKU_FAMILY), ["N"]);
        assert_eq!(values(&reqs, LABEL_SKU_SUBFAMILY), ["V"]);
        assert_eq!(values(&reqs, LABEL_SKU_VERSION), ["v4"]);
        assert!(!reqs.has(LABEL_SKU_CPU_CONSTRAINED));
        assert!(!reqs.has(LABEL_SKU_ACCELERATOR));

        assert_eq!(values(&reqs, LABEL_SKU_CPU_AMD), ["true"]);
        assert_eq!(operator(&reqs, LABEL_SKU_MEMORY_INTENSIVE), Operator::DoesNotExist);
    }

    #[test]
    fn test_capability_features() {
        let reqs = build(&nv16(), &[]);
        assert_eq!(values(&reqs, LABEL_SKU_STORAGE_PREMIUM_CAPABLE), ["true"]);
        assert_eq!(values(&reqs, LABEL_SKU_NETWORKING_ACCELERATED), ["true"]);
        assert_eq!(operator(&reqs, LABEL_SKU_ENCRYPTION_AT_HOST), Operator::DoesNotExist);
        assert_eq!(values(&reqs, LABEL_SKU_HYPERV_GENERATION), ["V1", "V2"]);
        assert_eq!(values(&reqs, LABEL_SKU_STORAGE_CACHED_DISK_BYTES), ["429496729600"]);
        assert_eq!(values(&reqs, LABEL_SKU_STORAGE_RESOURCE_VOLUME_MB), ["360448"]);
    }

    #[test]
    fn test_ephemeral_os_exception_by_series() {
        let reqs = build(&nv16(), &[]);
        assert_eq!(operator(&reqs, LABEL_SKU_STORAGE_EPHEMERAL_OS), Operator::DoesNotExist);

        let sku = RawSku::new("Standard_D2s_v3", "D2s_v3")
            .with_capability(capability::EPHEMERAL_OS_DISK, "True");
        let reqs = build(&sku, &[]);
        assert_eq!(values(&reqs, LABEL_SKU_STORAGE_EPHEMERAL_OS), ["true"]);
    }

    #[test]
    fn test_constrained_and_accelerator() {
        let reqs = build(&RawSku::new("Standard_M8-2ms_v2", "M8-2ms_v2"), &[]);
        assert_eq!(values(&reqs, LABEL_SKU_CPU_CONSTRAINED), ["2"]);
        assert_eq!(values(&reqs, LABEL_SKU_MEMORY_INTENSIVE), ["true"]);

        let reqs = build(&RawSku::new("Standard_NC4as_T4_v3", "NC4as_T4_v3"), &[]);
        assert_eq!(values(&reqs, LABEL_SKU_ACCELERATOR), ["T4"]);
    }

    #[test]
    fn test_unparsable_size_keeps_raw_name_only() {
        let sku = RawSku::new("Standard_M416s_8_v2", "M416s_8_v2")
            .with_capability(capability::CPU_ARCHITECTURE_TYPE, "Arm64")
            .with_capability(capability::PREMIUM_IO, "True");
        let reqs = build(&sku, &[]);

        assert_eq!(values(&reqs, LABEL_INSTANCE_TYPE), ["Standard_M416s_8_v2"]);
        assert_eq!(values(&reqs, LABEL_ARCH), ["arm64"]);
        assert!(!reqs.has(LABEL_SKU_SERIES));
        assert!(!reqs.has(LABEL_SKU_FAMILY));
        assert_eq!(operator(&reqs, LABEL_SKU_MEMORY_INTENSIVE), Operator::DoesNotExist);
        assert_eq!(values(&reqs, LABEL_SKU_STORAGE_PREMIUM_CAPABLE), ["true"]);
    }

    #[test]
    fn test_architecture_passthrough_and_default() {
        let sku = RawSku::new("Standard_X1", "X1")
            .with_capability(capability::CPU_ARCHITECTURE_TYPE, "riscv64");
        assert_eq!(values(&build(&sku, &[]), LABEL_ARCH), ["riscv64"]);

        let sku = RawSku::new("Standard_X1", "X1");
        assert_eq!(values(&build(&sku, &[]), LABEL_ARCH), ["amd64"]);
    }

    #[test]
    fn test_malformed_integer_capability_is_absent() {
        let sku = RawSku::new("Standard_D2s_v3", "D2s_v3")
            .with_capability(capability::CACHED_DISK_BYTES, "lots");
        let reqs = build(&sku, &[]);
        assert_eq!(operator(&reqs, LABEL_SKU_STORAGE_CACHED_DISK_BYTES), Operator::DoesNotExist);
    }

    #[test]
    fn test_deterministic() {
        let offerings = [offering("eastus-1", CapacityType::OnDemand)];
        assert_eq!(build(&nv16(), &offerings), build(&nv16(), &offerings));
    }
}

//! Requirement keys, resource names and the lookup tables that map SKU
//! naming and capabilities onto them.

// Well-known Kubernetes labels
pub const LABEL_INSTANCE_TYPE: &str = "node.kubernetes.io/instance-type";
pub const LABEL_ARCH: &str = "kubernetes.io/arch";
pub const LABEL_OS: &str = "kubernetes.io/os";
pub const LABEL_TOPOLOGY_ZONE: &str = "topology.kubernetes.io/zone";
pub const LABEL_TOPOLOGY_REGION: &str = "topology.kubernetes.io/region";
pub const LABEL_CAPACITY_TYPE: &str = "karpenter.sh/capacity-type";

// SKU identity
pub const LABEL_SKU_NAME: &str = "karpenter.azure.com/sku-name";
pub const LABEL_SKU_SERIES: &str = "karpenter.azure.com/sku-series";
pub const LABEL_SKU_FAMILY: &str = "karpenter.azure.com/sku-family";
pub const LABEL_SKU_SUBFAMILY: &str = "karpenter.azure.com/sku-subfamily";
pub const LABEL_SKU_VERSION: &str = "karpenter.azure.com/sku-version";
pub const LABEL_SKU_CPU_CONSTRAINED: &str = "karpenter.azure.com/sku-cpu-constrained";
pub const LABEL_SKU_ACCELERATOR: &str = "karpenter.azure.com/sku-accelerator";
pub const LABEL_SKU_CPU: &str = "karpenter.azure.com/sku-cpu";
pub const LABEL_SKU_MEMORY: &str = "karpenter.azure.com/sku-memory";

// Additive features
pub const LABEL_SKU_CPU_AMD: &str = "karpenter.azure.com/sku-cpu-amd";
pub const LABEL_SKU_STORAGE_BLOCK_PERFORMANCE: &str =
    "karpenter.azure.com/sku-storage-block-performance";
pub const LABEL_SKU_STORAGE_LOCAL_DISK: &str = "karpenter.azure.com/sku-storage-local-disk";
pub const LABEL_SKU_ISOLATED: &str = "karpenter.azure.com/sku-isolated";
pub const LABEL_SKU_MEMORY_LOW: &str = "karpenter.azure.com/sku-memory-low";
pub const LABEL_SKU_MEMORY_INTENSIVE: &str = "karpenter.azure.com/sku-memory-intensive";
pub const LABEL_SKU_MEMORY_TINY: &str = "karpenter.azure.com/sku-memory-tiny";
pub const LABEL_SKU_NETWORKING_RDMA: &str = "karpenter.azure.com/sku-networking-rdma";
pub const LABEL_SKU_CONFIDENTIAL: &str = "karpenter.azure.com/sku-confidential";
pub const LABEL_SKU_NODE_PACKING: &str = "karpenter.azure.com/sku-node-packing";

// Capability-derived features
pub const LABEL_SKU_STORAGE_PREMIUM_CAPABLE: &str =
    "karpenter.azure.com/sku-storage-premium-capable";
pub const LABEL_SKU_ENCRYPTION_AT_HOST: &str = "karpenter.azure.com/sku-encryptionathost-capable";
pub const LABEL_SKU_NETWORKING_ACCELERATED: &str = "karpenter.azure.com/sku-networking-accelerated";
pub const LABEL_SKU_STORAGE_EPHEMERAL_OS: &str = "karpenter.azure.com/sku-storage-ephemeralos-capable";
pub const LABEL_SKU_HYPERV_GENERATION: &str = "karpenter.azure.com/sku-hyperv-generation";
pub const LABEL_SKU_STORAGE_CACHED_DISK_BYTES: &str =
    "karpenter.azure.com/sku-storage-cached-disk-bytes";
pub const LABEL_SKU_STORAGE_RESOURCE_VOLUME_MB: &str =
    "karpenter.azure.com/sku-storage-resource-volume-mb";

/// Value written into a feature key when the feature is present
pub const FEATURE_PRESENT: &str = "true";

/// Only Linux nodes are provisioned
pub const OS_LINUX: &str = "linux";

/// Architecture assumed when a SKU does not report one
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

// Resource names
pub const RESOURCE_CPU: &str = "cpu";
pub const RESOURCE_MEMORY: &str = "memory";
pub const RESOURCE_EPHEMERAL_STORAGE: &str = "ephemeral-storage";
pub const RESOURCE_PODS: &str = "pods";
pub const RESOURCE_NVIDIA_GPU: &str = "nvidia.com/gpu";

/// Additive feature token → requirement key
pub const ADDITIVE_FEATURE_KEYS: &[(&str, &str)] = &[
    ("a", LABEL_SKU_CPU_AMD),
    ("b", LABEL_SKU_STORAGE_BLOCK_PERFORMANCE),
    ("d", LABEL_SKU_STORAGE_LOCAL_DISK),
    ("i", LABEL_SKU_ISOLATED),
    ("l", LABEL_SKU_MEMORY_LOW),
    ("m", LABEL_SKU_MEMORY_INTENSIVE),
    ("t", LABEL_SKU_MEMORY_TINY),
    ("r", LABEL_SKU_NETWORKING_RDMA),
    ("C", LABEL_SKU_CONFIDENTIAL),
    ("NP", LABEL_SKU_NODE_PACKING),
];

/// Additive feature tokens already expressed through capability-derived keys
/// (`s` premium storage, `p` ARM architecture); skipped without logging.
pub const IGNORED_ADDITIVE_FEATURES: &[&str] = &["s", "p"];

/// Two-letter additive tokens, matched before single characters
pub const MULTI_CHAR_ADDITIVE_FEATURES: &[&str] = &["NP"];

/// Vendor architecture name → Kubernetes architecture
pub const ARCHITECTURE_ALIASES: &[(&str, &str)] = &[("x64", "amd64"), ("Arm64", "arm64")];

/// Series reporting ephemeral OS disk support they cannot honour
pub const EPHEMERAL_OS_DISK_UNSUPPORTED_SERIES: &[&str] = &["NVas_v4"];

/// Every feature key, seeded as `DoesNotExist` so all instance types share
/// one key space
pub const FEATURE_KEYS: &[&str] = &[
    LABEL_SKU_CPU_AMD,
    LABEL_SKU_STORAGE_BLOCK_PERFORMANCE,
    LABEL_SKU_STORAGE_LOCAL_DISK,
    LABEL_SKU_ISOLATED,
    LABEL_SKU_MEMORY_LOW,
    LABEL_SKU_MEMORY_INTENSIVE,
    LABEL_SKU_MEMORY_TINY,
    LABEL_SKU_NETWORKING_RDMA,
    LABEL_SKU_CONFIDENTIAL,
    LABEL_SKU_NODE_PACKING,
    LABEL_SKU_STORAGE_PREMIUM_CAPABLE,
    LABEL_SKU_ENCRYPTION_AT_HOST,
    LABEL_SKU_NETWORKING_ACCELERATED,
    LABEL_SKU_STORAGE_EPHEMERAL_OS,
    LABEL_SKU_HYPERV_GENERATION,
    LABEL_SKU_STORAGE_CACHED_DISK_BYTES,
    LABEL_SKU_STORAGE_RESOURCE_VOLUME_MB,
];

/// Sizes known not to follow the naming grammar; parse failures for these
/// are not logged
pub const DEFAULT_SIZE_PARSE_IGNORE_LIST: &[&str] = &[
    "M416s_8_v2",
    "M416s_10_v2",
    "M832is_16_v3",
    "M832s_16_v3",
    "M1792ixds_32_v3",
    "ND96isr_MI300X_v5",
];

pub fn additive_feature_key(token: &str) -> Option<&'static str> {
    ADDITIVE_FEATURE_KEYS
        .iter()
        .find(|(t, _)| *t == token)
        .map(|(_, key)| *key)
}

pub fn architecture_alias(vendor: &str) -> Option<&'static str> {
    ARCHITECTURE_ALIASES
        .iter()
        .find(|(v, _)| *v == vendor)
        .map(|(_, arch)| *arch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_additive_keys_are_feature_keys() {
        for (_, key) in ADDITIVE_FEATURE_KEYS {
            assert!(FEATURE_KEYS.contains(key), "{key} missing from FEATURE_KEYS");
        }
    }

    #[test]
    fn test_feature_keys_unique() {
        let unique: BTreeSet<_> = FEATURE_KEYS.iter().collect();
        assert_eq!(unique.len(), FEATURE_KEYS.len());
    }

    #[test]
    fn test_ignored_tokens_have_no_key() {
        for token in IGNORED_ADDITIVE_FEATURES {
            assert_eq!(additive_feature_key(token), None);
        }
    }

    #[test]
    fn test_architecture_aliases() {
        assert_eq!(architecture_alias("x64"), Some("amd64"));
        assert_eq!(architecture_alias("Arm64"), Some("arm64"));
        assert_eq!(architecture_alias("riscv"), None);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kubelet settings that change capacity and overhead.
///
/// Every field is optional; an empty configuration yields the built-in
/// defaults. Reservation and eviction maps hold raw strings (`"100m"`,
/// `"1Gi"`, `"10%"`) and are validated when an instance type is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubeletConfiguration {
    pub max_pods: Option<i32>,
    pub pods_per_core: Option<i32>,
    pub system_reserved: BTreeMap<String, String>,
    pub kube_reserved: BTreeMap<String, String>,
    pub eviction_hard: BTreeMap<String, String>,
    pub eviction_soft: BTreeMap<String, String>,
}

impl KubeletConfiguration {
    pub fn with_max_pods(mut self, max_pods: i32) -> Self {
        self.max_pods = Some(max_pods);
        self
    }

    pub fn with_pods_per_core(mut self, pods_per_core: i32) -> Self {
        self.pods_per_core = Some(pods_per_core);
        self
    }

    pub fn with_eviction_hard(mut self, signal: &str, value: &str) -> Self {
        self.eviction_hard.insert(signal.to_string(), value.to_string());
        self
    }

    pub fn with_eviction_soft(mut self, signal: &str, value: &str) -> Self {
        self.eviction_soft.insert(signal.to_string(), value.to_string());
        self
    }
}

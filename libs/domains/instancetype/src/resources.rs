//! Capacity and overhead arithmetic.
//!
//! All quantities are fixed-point; percentages and reservation rates are
//! evaluated with `rust_decimal`. Byte amounts round up to a whole byte,
//! CPU to the next millicore.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{InstanceTypeError, InstanceTypeResult};
use crate::instance_type::Overhead;
use crate::kubelet::KubeletConfiguration;
use crate::labels::*;
use crate::models::{RawSku, capability};
use crate::quantity::{Quantity, ResourceList};

pub const DEFAULT_MAX_PODS: i64 = 110;

/// The vendor reports no local storage signal
pub const EPHEMERAL_STORAGE_CAPACITY: Quantity = Quantity::gibibytes(128);

pub const SYSTEM_RESERVED_CPU: Quantity = Quantity::from_milli(100);
pub const SYSTEM_RESERVED_MEMORY: Quantity = Quantity::mebibytes(100);
pub const SYSTEM_RESERVED_EPHEMERAL_STORAGE: Quantity = Quantity::gibibytes(1);

pub const KUBE_RESERVED_MEMORY_PER_POD: Quantity = Quantity::mebibytes(11);
pub const KUBE_RESERVED_MEMORY_BASE: Quantity = Quantity::mebibytes(255);
pub const KUBE_RESERVED_EPHEMERAL_STORAGE: Quantity = Quantity::gibibytes(1);

pub const DEFAULT_MEMORY_EVICTION: Quantity = Quantity::mebibytes(100);
pub const MEMORY_AVAILABLE_SIGNAL: &str = "memory.available";

/// Kube-reserved CPU bands: (lower millicores, upper millicores, marginal
/// rate in basis points)
pub const KUBE_RESERVED_CPU_BANDS: &[(i64, i64, i64)] = &[
    (0, 1000, 600),
    (1000, 2000, 100),
    (2000, 4000, 50),
    (4000, i64::MAX, 25),
];

const GIB: i64 = 1024 * 1024 * 1024;

fn out_of_range(field: &str, value: impl ToString) -> InstanceTypeError {
    InstanceTypeError::QuantityOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn units(field: &str, n: i64) -> InstanceTypeResult<Quantity> {
    Quantity::checked_from_units(n).ok_or_else(|| out_of_range(field, n))
}

/// Capacity of `sku` under `kubelet`
pub fn compute_capacity(
    sku: &RawSku,
    kubelet: &KubeletConfiguration,
) -> InstanceTypeResult<ResourceList> {
    let vcpus = sku
        .int_capability(capability::VCPUS_AVAILABLE)
        .or_else(|| sku.int_capability(capability::VCPUS))
        .unwrap_or_default();

    // Bytes are whole units
    let memory = match sku.decimal_capability(capability::MEMORY_GB) {
        Some(gb) => gb
            .checked_mul(Decimal::from(GIB))
            .and_then(Quantity::from_decimal_units)
            .ok_or_else(|| out_of_range(capability::MEMORY_GB, gb))?,
        None => Quantity::ZERO,
    };

    let mut capacity = ResourceList::from([
        (RESOURCE_CPU.to_string(), units(capability::VCPUS, vcpus)?),
        (RESOURCE_MEMORY.to_string(), memory),
        (RESOURCE_EPHEMERAL_STORAGE.to_string(), EPHEMERAL_STORAGE_CAPACITY),
        (RESOURCE_PODS.to_string(), units(RESOURCE_PODS, pods(vcpus, kubelet))?),
    ]);

    if let Some(gpus) = sku.int_capability(capability::GPUS).filter(|n| *n > 0) {
        capacity.insert(RESOURCE_NVIDIA_GPU.to_string(), units(capability::GPUS, gpus)?);
    }

    Ok(capacity)
}

/// Pod capacity: `maxPods` (default 110), capped by `podsPerCore × vCPU`
pub fn pods(vcpus: i64, kubelet: &KubeletConfiguration) -> i64 {
    let max_pods = kubelet.max_pods.map(i64::from).unwrap_or(DEFAULT_MAX_PODS);
    match kubelet.pods_per_core.map(i64::from) {
        Some(per_core) if per_core > 0 => max_pods.min(per_core.saturating_mul(vcpus)),
        _ => max_pods,
    }
}

/// Reservations and eviction threshold for a machine with `capacity`
pub fn compute_overhead(
    capacity: &ResourceList,
    kubelet: &KubeletConfiguration,
) -> InstanceTypeResult<Overhead> {
    let get = |name: &str| capacity.get(name).copied().unwrap_or_default();

    Ok(Overhead {
        system_reserved: system_reserved(kubelet)?,
        kube_reserved: kube_reserved(get(RESOURCE_CPU), get(RESOURCE_PODS).value(), kubelet)?,
        eviction_threshold: eviction_threshold(get(RESOURCE_MEMORY), kubelet)?,
    })
}

pub fn system_reserved(kubelet: &KubeletConfiguration) -> InstanceTypeResult<ResourceList> {
    let defaults = ResourceList::from([
        (RESOURCE_CPU.to_string(), SYSTEM_RESERVED_CPU),
        (RESOURCE_MEMORY.to_string(), SYSTEM_RESERVED_MEMORY),
        (RESOURCE_EPHEMERAL_STORAGE.to_string(), SYSTEM_RESERVED_EPHEMERAL_STORAGE),
    ]);
    merge_overrides(defaults, "systemReserved", &kubelet.system_reserved)
}

pub fn kube_reserved(
    cpu: Quantity,
    pods: i64,
    kubelet: &KubeletConfiguration,
) -> InstanceTypeResult<ResourceList> {
    let memory = KUBE_RESERVED_MEMORY_PER_POD
        .milli_value()
        .checked_mul(pods)
        .and_then(|per_pod| per_pod.checked_add(KUBE_RESERVED_MEMORY_BASE.milli_value()))
        .map(Quantity::from_milli)
        .ok_or_else(|| out_of_range("kubeReserved.memory", format!("{pods} pods")))?;
    let defaults = ResourceList::from([
        (RESOURCE_CPU.to_string(), kube_reserved_cpu(cpu)),
        (RESOURCE_MEMORY.to_string(), memory),
        (RESOURCE_EPHEMERAL_STORAGE.to_string(), KUBE_RESERVED_EPHEMERAL_STORAGE),
    ]);
    merge_overrides(defaults, "kubeReserved", &kubelet.kube_reserved)
}

/// Marginal-rate CPU reservation over [`KUBE_RESERVED_CPU_BANDS`]
pub fn kube_reserved_cpu(cpu: Quantity) -> Quantity {
    let millicores = cpu.milli_value();
    let reserved: Decimal = KUBE_RESERVED_CPU_BANDS
        .iter()
        .filter(|(lower, _, _)| *lower <= millicores)
        .map(|(lower, upper, rate)| {
            let span = millicores.min(*upper) - lower;
            Decimal::new(*rate, 4) * Decimal::from(span)
        })
        .sum();

    // `reserved` is in millicores
    Quantity::from_decimal(reserved / Decimal::from(1000)).unwrap_or_default()
}

/// Memory eviction threshold from the `memory.available` hard and soft
/// signals; 100Mi when neither is set
pub fn eviction_threshold(
    memory: Quantity,
    kubelet: &KubeletConfiguration,
) -> InstanceTypeResult<ResourceList> {
    let hard = signal_threshold(memory, "evictionHard", &kubelet.eviction_hard)?;
    let soft = signal_threshold(memory, "evictionSoft", &kubelet.eviction_soft)?;

    let threshold = match (hard, soft) {
        (Some(hard), Some(soft)) => hard.max(soft),
        (Some(one), None) | (None, Some(one)) => one,
        (None, None) => DEFAULT_MEMORY_EVICTION,
    };

    Ok(ResourceList::from([(RESOURCE_MEMORY.to_string(), threshold)]))
}

fn signal_threshold(
    memory: Quantity,
    source: &str,
    signals: &BTreeMap<String, String>,
) -> InstanceTypeResult<Option<Quantity>> {
    let Some(raw) = signals.get(MEMORY_AVAILABLE_SIGNAL) else {
        return Ok(None);
    };
    let invalid = |reason: &str| InstanceTypeError::InvalidEvictionThreshold {
        signal: format!("{source}.{MEMORY_AVAILABLE_SIGNAL}"),
        value: raw.clone(),
        reason: reason.to_string(),
    };

    let raw = raw.trim();
    let Some(percent) = raw.strip_suffix('%') else {
        return raw
            .parse::<Quantity>()
            .map(Some)
            .map_err(|e| invalid(&e.to_string()));
    };

    let mut percent: Decimal = percent
        .trim()
        .parse()
        .map_err(|_| invalid("percentage is not a number"))?;
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(invalid("percentage must be between 0 and 100"));
    }
    // 100% disables the signal
    if percent == Decimal::ONE_HUNDRED {
        percent = Decimal::ZERO;
    }

    let bytes = (percent / Decimal::ONE_HUNDRED * memory.to_decimal()).ceil();
    Quantity::from_decimal(bytes)
        .map(Some)
        .ok_or_else(|| invalid("threshold out of range"))
}

fn merge_overrides(
    mut defaults: ResourceList,
    source: &str,
    overrides: &BTreeMap<String, String>,
) -> InstanceTypeResult<ResourceList> {
    for (name, raw) in overrides {
        let quantity = raw
            .parse::<Quantity>()
            .map_err(|source_err| InstanceTypeError::InvalidQuantity {
                field: format!("{source}.{name}"),
                value: raw.clone(),
                source: source_err,
            })?;
        defaults.insert(name.clone(), quantity);
    }
    Ok(defaults)
}

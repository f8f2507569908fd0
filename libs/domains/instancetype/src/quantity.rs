//! Fixed-point resource quantities.
//!
//! A [`Quantity`] holds an integer number of milli-units, so `100m` CPU and
//! `1Gi` memory are both exact. Parsing accepts Kubernetes suffixes; values
//! with sub-milli precision are rounded up.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::QuantityParseError;

/// Resource name → quantity, ordered for stable output
pub type ResourceList = BTreeMap<String, Quantity>;

const KI: i64 = 1024;
const MI: i64 = KI * 1024;
const GI: i64 = MI * 1024;

const BINARY_SUFFIXES: &[(&str, i64)] = &[
    ("Ei", GI * GI),
    ("Pi", MI * GI),
    ("Ti", KI * GI),
    ("Gi", GI),
    ("Mi", MI),
    ("Ki", KI),
];

const DECIMAL_SUFFIXES: &[(&str, i64)] = &[
    ("E", 1_000_000_000_000_000_000),
    ("P", 1_000_000_000_000_000),
    ("T", 1_000_000_000_000),
    ("G", 1_000_000_000),
    ("M", 1_000_000),
    ("k", 1_000),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    milli: i64,
}

impl Quantity {
    pub const ZERO: Quantity = Quantity { milli: 0 };

    pub const fn from_milli(milli: i64) -> Self {
        Self { milli }
    }

    pub const fn from_units(units: i64) -> Self {
        Self {
            milli: units * 1000,
        }
    }

    pub const fn mebibytes(n: i64) -> Self {
        Self::from_units(n * MI)
    }

    pub const fn gibibytes(n: i64) -> Self {
        Self::from_units(n * GI)
    }

    /// Exact decimal amount of whole units, rounded up to the next milli-unit.
    ///
    /// `None` when the value does not fit.
    pub fn from_decimal(units: Decimal) -> Option<Self> {
        let milli = units.checked_mul(Decimal::from(1000))?.ceil().to_i64()?;
        Some(Self { milli })
    }

    /// Exact decimal amount rounded up to a whole unit, for byte and count
    /// resources that cannot be fractional
    pub fn from_decimal_units(units: Decimal) -> Option<Self> {
        Self::from_decimal(units.ceil())
    }

    /// `None` when `units` does not fit
    pub const fn checked_from_units(units: i64) -> Option<Self> {
        match units.checked_mul(1000) {
            Some(milli) => Some(Self { milli }),
            None => None,
        }
    }

    pub fn milli_value(&self) -> i64 {
        self.milli
    }

    /// Whole units, rounded up
    pub fn value(&self) -> i64 {
        self.milli.div_euclid(1000) + i64::from(self.milli.rem_euclid(1000) != 0)
    }

    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.milli, 3)
    }

    pub fn is_zero(&self) -> bool {
        self.milli == 0
    }

    /// `self - rhs`, clamped at zero
    pub fn saturating_sub(self, rhs: Quantity) -> Quantity {
        Quantity::from_milli(self.milli.saturating_sub(rhs.milli).max(0))
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity::from_milli(self.milli.saturating_add(rhs.milli))
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Quantity) {
        *self = *self + rhs;
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || QuantityParseError(s.to_string());
        let trimmed = s.trim();

        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(trimmed.len());
        let (number, suffix) = trimmed.split_at(split);
        if number.is_empty() {
            return Err(err());
        }
        let number = Decimal::from_str(number).map_err(|_| err())?;

        let units = if suffix.is_empty() {
            number
        } else if suffix == "m" {
            number / Decimal::from(1000)
        } else {
            let multiplier = BINARY_SUFFIXES
                .iter()
                .chain(DECIMAL_SUFFIXES)
                .find(|(sfx, _)| *sfx == suffix)
                .map(|(_, m)| *m)
                .ok_or_else(err)?;
            number.checked_mul(Decimal::from(multiplier)).ok_or_else(err)?
        };

        Quantity::from_decimal(units).ok_or_else(err)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.milli % 1000 != 0 {
            return write!(f, "{}m", self.milli);
        }
        let units = self.milli / 1000;
        if units != 0 {
            for (suffix, multiplier) in BINARY_SUFFIXES {
                if units.abs() >= *multiplier && units % multiplier == 0 {
                    return write!(f, "{}{}", units / multiplier, suffix);
                }
            }
        }
        write!(f, "{units}")
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Key-wise sum of several resource lists
pub fn merge_sum<'a>(lists: impl IntoIterator<Item = &'a ResourceList>) -> ResourceList {
    let mut total = ResourceList::new();
    for list in lists {
        for (name, quantity) in list {
            *total.entry(name.clone()).or_default() += *quantity;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_suffixes() {
        assert_eq!(q("100m").milli_value(), 100);
        assert_eq!(q("2").milli_value(), 2000);
        assert_eq!(q("1.5").milli_value(), 1500);
        assert_eq!(q("1Gi"), Quantity::gibibytes(1));
        assert_eq!(q("255Mi"), Quantity::mebibytes(255));
        assert_eq!(q("1k"), Quantity::from_units(1000));
        assert_eq!(q("1.5G"), Quantity::from_units(1_500_000_000));
        assert_eq!(q(" 110 "), Quantity::from_units(110));
    }

    #[test]
    fn test_parse_rounds_up_sub_milli() {
        assert_eq!(q("0.0001").milli_value(), 1);
        assert_eq!(q("1.5m").milli_value(), 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "Gi", "ten", "1Qi", "1 Gi", "--1"] {
            assert!(bad.parse::<Quantity>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(Quantity::from_milli(65).to_string(), "65m");
        assert_eq!(Quantity::from_units(2).to_string(), "2");
        assert_eq!(Quantity::from_units(110).to_string(), "110");
        assert_eq!(Quantity::mebibytes(1465).to_string(), "1465Mi");
        assert_eq!(Quantity::gibibytes(1).to_string(), "1Gi");
        assert_eq!(Quantity::gibibytes(1024).to_string(), "1Ti");
        assert_eq!(Quantity::from_units(1_000_000).to_string(), "1000000");
        assert_eq!(Quantity::ZERO.to_string(), "0");
    }

    #[test]
    fn test_from_decimal_units_is_whole() {
        let q = Quantity::from_decimal_units(Decimal::new(11, 1)).unwrap();
        assert_eq!(q, Quantity::from_units(2));
        assert_eq!(Quantity::from_decimal_units(Decimal::from(3)), Some(Quantity::from_units(3)));
    }

    #[test]
    fn test_checked_from_units() {
        assert_eq!(Quantity::checked_from_units(4), Some(Quantity::from_units(4)));
        assert_eq!(Quantity::checked_from_units(i64::MAX / 10), None);
    }

    #[test]
    fn test_value_rounds_up() {
        assert_eq!(Quantity::from_milli(1500).value(), 2);
        assert_eq!(Quantity::from_milli(2000).value(), 2);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Quantity::mebibytes(100)).unwrap();
        assert_eq!(json, "\"100Mi\"");
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Quantity::mebibytes(100));
    }

    #[test]
    fn test_merge_sum() {
        let a = ResourceList::from([("cpu".to_string(), q("100m")), ("memory".to_string(), q("1Gi"))]);
        let b = ResourceList::from([("cpu".to_string(), q("65m"))]);
        let total = merge_sum([&a, &b]);
        assert_eq!(total["cpu"], q("165m"));
        assert_eq!(total["memory"], q("1Gi"));
    }
}

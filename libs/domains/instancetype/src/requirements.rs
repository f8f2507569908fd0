//! Label-style scheduling constraints.
//!
//! A [`Requirements`] set holds at most one [`Requirement`] per key. Adding a
//! second requirement for a key narrows the existing one with
//! [`Requirement::intersect`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub values: BTreeSet<String>,
}

impl Requirement {
    pub fn new<I, S>(key: &str, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.to_string(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn in_values<I, S>(key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(key, Operator::In, values)
    }

    pub fn single(key: &str, value: impl Into<String>) -> Self {
        Self::in_values(key, [value.into()])
    }

    pub fn exists(key: &str) -> Self {
        Self::new(key, Operator::Exists, Vec::<String>::new())
    }

    pub fn does_not_exist(key: &str) -> Self {
        Self::new(key, Operator::DoesNotExist, Vec::<String>::new())
    }

    /// Narrow `self` by `other`; both must carry the same key.
    ///
    /// An empty `In` is the unsatisfiable result.
    pub fn intersect(&self, other: &Requirement) -> Requirement {
        use Operator::*;

        let (operator, values) = match (self.operator, other.operator) {
            (Exists, _) => (other.operator, other.values.clone()),
            (_, Exists) => (self.operator, self.values.clone()),
            (In, In) => (In, self.values.intersection(&other.values).cloned().collect()),
            (In, NotIn) => (In, self.values.difference(&other.values).cloned().collect()),
            (NotIn, In) => (In, other.values.difference(&self.values).cloned().collect()),
            (NotIn, NotIn) => (NotIn, self.values.union(&other.values).cloned().collect()),
            (DoesNotExist, DoesNotExist | NotIn) | (NotIn, DoesNotExist) => {
                (DoesNotExist, BTreeSet::new())
            }
            (DoesNotExist, In) | (In, DoesNotExist) => (In, BTreeSet::new()),
        };

        Requirement {
            key: self.key.clone(),
            operator,
            values,
        }
    }

    /// Whether a label value (or its absence) satisfies this requirement
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self.operator, value) {
            (Operator::In, Some(v)) => self.values.contains(v),
            (Operator::In, None) => false,
            (Operator::NotIn, Some(v)) => !self.values.contains(v),
            (Operator::NotIn, None) => true,
            (Operator::Exists, v) => v.is_some(),
            (Operator::DoesNotExist, v) => v.is_none(),
        }
    }
}

/// Requirement per key, ordered by key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Requirements(BTreeMap<String, Requirement>);

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `requirement`, intersecting with any existing one for its key
    pub fn add(&mut self, requirement: Requirement) {
        match self.0.get_mut(&requirement.key) {
            Some(existing) => *existing = existing.intersect(&requirement),
            None => {
                self.0.insert(requirement.key.clone(), requirement);
            }
        }
    }

    /// Insert `requirement`, replacing any existing one for its key
    pub fn set(&mut self, requirement: Requirement) {
        self.0.insert(requirement.key.clone(), requirement);
    }

    /// Add `value` to the key's `In` set, turning any other operator into
    /// `In { value }`
    pub fn insert_value(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.get_mut(key) {
            Some(existing) if existing.operator == Operator::In => {
                existing.values.insert(value);
            }
            _ => self.set(Requirement::single(key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Requirement> {
        self.0.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.0.values()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Requirement> for Requirements {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        let mut requirements = Requirements::new();
        for requirement in iter {
            requirements.add(requirement);
        }
        requirements
    }
}

//! Matrix expansion - turns axes, includes and excludes into concrete combinations
//!
//! Include entries are applied in declaration order against the *base*
//! combinations (the cartesian product after excludes):
//!
//! - keys of the include that name an axis are its selector
//! - when the selector matches one or more base combinations, every other key
//!   of the include is merged into each match, overwriting fields merged by
//!   earlier includes (axis values themselves are never overwritten)
//! - when the include has no selector keys or matches no base combination,
//!   it is appended as a new combination of its own
//!
//! Two appended includes with the same mapping are rejected as a
//! [`ConfigError::DuplicateCombination`]. A matrix whose excludes remove
//! every combination, with nothing included back, is a
//! [`ConfigError::EmptyMatrix`].

use crate::core::error::ConfigError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One named dimension of the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub values: Vec<String>,
}

impl Axis {
    pub fn new<N, I, V>(name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered key -> value mapping
///
/// Used for matrix combinations as well as include and exclude entries.
/// Order is kept for display; equality and hashing ignore it.
#[derive(Debug, Clone, Default, Eq)]
pub struct Combination(Vec<(String, String)>);

impl Combination {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert a value, replacing an existing one in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Same keys and values, regardless of order
    pub fn same_mapping(&self, other: &Combination) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }

    /// True when every entry of `selector` is present with the same value
    pub fn matches(&self, selector: &Combination) -> bool {
        selector.iter().all(|(k, v)| self.get(k) == Some(v))
    }
}

impl PartialEq for Combination {
    fn eq(&self, other: &Self) -> bool {
        self.same_mapping(other)
    }
}

impl Hash for Combination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort_unstable();
        pairs.hash(state);
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl Serialize for Combination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Combination {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut combination = Combination::new();
        for (k, v) in iter {
            combination.insert(k, v);
        }
        combination
    }
}

/// Matrix specification: cartesian axes plus include/exclude entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixSpec {
    pub axes: Vec<Axis>,
    pub include: Vec<Combination>,
    pub exclude: Vec<Combination>,
}

impl MatrixSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    pub fn include(mut self, entry: Combination) -> Self {
        self.include.push(entry);
        self
    }

    pub fn exclude(mut self, entry: Combination) -> Self {
        self.exclude.push(entry);
        self
    }

    /// True when the spec describes a single, unparameterized instance
    pub fn is_trivial(&self) -> bool {
        self.axes.is_empty() && self.include.is_empty()
    }
}

/// One expanded matrix combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixInstance {
    /// Identity of the combination (axis values, or the full include mapping)
    pub key: Combination,
    /// Resolved variables: axis values plus merged include fields
    pub variables: Combination,
}

/// Matrix expander
pub struct MatrixExpander;

impl MatrixExpander {
    /// Expand a matrix into its ordered list of combinations
    pub fn expand(spec: &MatrixSpec) -> Result<Vec<MatrixInstance>, ConfigError> {
        Self::validate_axes(&spec.axes)?;
        let axis_names: HashSet<&str> = spec.axes.iter().map(|a| a.name.as_str()).collect();

        let mut base = Self::cartesian_product(&spec.axes, spec.include.is_empty());

        for entry in &spec.exclude {
            if let Some((key, _)) = entry.iter().find(|(k, _)| !axis_names.contains(k)) {
                return Err(ConfigError::UnknownExcludeKey { key: key.to_string() });
            }
        }
        base.retain(|combination| {
            !spec
                .exclude
                .iter()
                .any(|entry| !entry.is_empty() && combination.matches(entry))
        });

        let base_count = base.len();
        let mut instances: Vec<MatrixInstance> = base
            .into_iter()
            .map(|key| MatrixInstance {
                variables: key.clone(),
                key,
            })
            .collect();

        for entry in &spec.include {
            let (selector, extra): (Vec<_>, Vec<_>) =
                entry.iter().partition(|(k, _)| axis_names.contains(k));
            let selector: Combination = selector.into_iter().collect();

            let matching: Vec<usize> = if selector.is_empty() {
                Vec::new()
            } else {
                (0..base_count)
                    .filter(|&i| instances[i].key.matches(&selector))
                    .collect()
            };

            if matching.is_empty() {
                if instances.iter().any(|i| i.key.same_mapping(entry)) {
                    return Err(ConfigError::DuplicateCombination {
                        combination: entry.to_string(),
                    });
                }
                instances.push(MatrixInstance {
                    key: entry.clone(),
                    variables: entry.clone(),
                });
                continue;
            }

            for i in matching {
                for (k, v) in &extra {
                    instances[i].variables.insert(*k, *v);
                }
            }
        }

        if instances.is_empty() {
            return Err(ConfigError::EmptyMatrix {
                excluded: spec.exclude.len(),
            });
        }

        Ok(instances)
    }

    fn validate_axes(axes: &[Axis]) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for axis in axes {
            if !names.insert(axis.name.as_str()) {
                return Err(ConfigError::DuplicateAxis { axis: axis.name.clone() });
            }
            if axis.values.is_empty() {
                return Err(ConfigError::EmptyAxis { axis: axis.name.clone() });
            }
            let mut seen = HashSet::new();
            for value in &axis.values {
                if !seen.insert(value.as_str()) {
                    return Err(ConfigError::DuplicateAxisValue {
                        axis: axis.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Product in axis order, last axis varying fastest
    fn cartesian_product(axes: &[Axis], keep_empty: bool) -> Vec<Combination> {
        if axes.is_empty() {
            return if keep_empty { vec![Combination::new()] } else { Vec::new() };
        }

        axes.iter().fold(vec![Combination::new()], |acc, axis| {
            acc.iter()
                .flat_map(|combination| {
                    axis.values
                        .iter()
                        .map(move |value| combination.clone().with(axis.name.clone(), value.clone()))
                })
                .collect()
        })
    }
}

//! Dependency lists.
//!
//! Package entries in `dependencies.yaml` are either plain specifiers
//! (`numpy>=1.23`) or single-key mappings naming an extra group, such as the
//! `pip:` section of a conda environment. They are kept tagged as
//! [`DependencyItem`] from parsing through deduplication.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_yaml::Value;

/// One entry of a package list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DependencyItem {
    /// A plain package specifier
    Package(String),

    /// Packages listed under a named extra group
    Group { name: String, packages: Vec<String> },
}

impl DependencyItem {
    /// Create a plain package entry.
    pub fn package(spec: impl Into<String>) -> Self {
        DependencyItem::Package(spec.into())
    }

    /// Create an extra group entry.
    pub fn group<S: Into<String>>(name: impl Into<String>, packages: impl IntoIterator<Item = S>) -> Self {
        DependencyItem::Group {
            name: name.into(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Deserialize a `packages:` list. `null` is an empty list, and a mapping
/// with several keys becomes one group per key.
pub(crate) fn deserialize_packages<'de, D>(deserializer: D) -> Result<Vec<DependencyItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    let mut items = Vec::with_capacity(raw.len());

    for value in raw {
        match value {
            Value::String(spec) => items.push(DependencyItem::Package(spec)),
            Value::Mapping(mapping) => {
                for (key, packages) in mapping {
                    let name = match key {
                        Value::String(name) => name,
                        _ => return Err(D::Error::custom("extra group names must be strings")),
                    };
                    let packages: Vec<String> = match packages {
                        Value::Null => Vec::new(),
                        other => serde_yaml::from_value(other).map_err(|e| {
                            D::Error::custom(format!("invalid packages in group `{}`: {}", name, e))
                        })?,
                    };
                    items.push(DependencyItem::Group { name, packages });
                }
            }
            other => {
                return Err(D::Error::custom(format!(
                    "package entries must be strings or mappings, found {:?}",
                    other
                )))
            }
        }
    }

    Ok(items)
}

/// An accumulated list of dependency entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    items: Vec<DependencyItem>,
}

impl DependencyList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries to the list.
    pub fn extend<'a>(&mut self, items: impl IntoIterator<Item = &'a DependencyItem>) {
        self.items.extend(items.into_iter().cloned());
    }

    /// All entries, in accumulation order.
    pub fn items(&self) -> &[DependencyItem] {
        &self.items
    }

    /// Plain specifiers, in list order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            DependencyItem::Package(spec) => Some(spec.as_str()),
            DependencyItem::Group { .. } => None,
        })
    }

    /// Extra groups, in list order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.items.iter().filter_map(|item| match item {
            DependencyItem::Group { name, packages } => Some((name.as_str(), packages.as_slice())),
            DependencyItem::Package(_) => None,
        })
    }

    /// Collapse the list into its canonical form.
    ///
    /// Plain specifiers come first, unique and sorted. They are followed by
    /// one entry per extra group, sorted by group name, holding the sorted
    /// union of every occurrence of that group. The result does not depend
    /// on the order of the input.
    pub fn dedupe(&self) -> DependencyList {
        let mut specs = BTreeSet::new();
        let mut groups: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        for item in &self.items {
            match item {
                DependencyItem::Package(spec) => {
                    specs.insert(spec.as_str());
                }
                DependencyItem::Group { name, packages } => {
                    groups
                        .entry(name.as_str())
                        .or_default()
                        .extend(packages.iter().map(String::as_str));
                }
            }
        }

        let items = specs
            .into_iter()
            .map(DependencyItem::package)
            .chain(
                groups
                    .into_iter()
                    .map(|(name, packages)| DependencyItem::group(name, packages)),
            )
            .collect();

        DependencyList { items }
    }
}

impl FromIterator<DependencyItem> for DependencyList {
    fn from_iter<I: IntoIterator<Item = DependencyItem>>(iter: I) -> Self {
        DependencyList {
            items: iter.into_iter().collect(),
        }
    }
}

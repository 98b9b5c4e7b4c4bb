//! Ordered package → implementor list mapping.
//!
//! # Invariants
//! - Package names are unique keys.
//! - First insertion fixes a package's display position; replacing its list
//!   keeps that position.
//! - An empty implementor list is a present entry, distinct from absence.

use crate::model::descriptor::ImplementorDescriptor;
use indexmap::map::{IntoIter, Iter};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Implementors per package, in stable display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityMapping {
    packages: IndexMap<String, Vec<ImplementorDescriptor>>,
}

impl CapabilityMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one package's implementor list, replacing any previous list
    /// entirely. Returns the replaced list.
    pub fn insert(
        &mut self,
        package: impl Into<String>,
        implementors: Vec<ImplementorDescriptor>,
    ) -> Option<Vec<ImplementorDescriptor>> {
        self.packages.insert(package.into(), implementors)
    }

    /// Overwrites this mapping's entries with every package in `other`.
    pub fn overwrite_from(&mut self, other: CapabilityMapping) {
        for (package, implementors) in other {
            self.packages.insert(package, implementors);
        }
    }

    pub fn get(&self, package: &str) -> Option<&[ImplementorDescriptor]> {
        self.packages.get(package).map(Vec::as_slice)
    }

    pub fn contains_package(&self, package: &str) -> bool {
        self.packages.contains_key(package)
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Package names in display order.
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Total implementors across all packages.
    pub fn implementor_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> Iter<'_, String, Vec<ImplementorDescriptor>> {
        self.packages.iter()
    }
}

impl<P> FromIterator<(P, Vec<ImplementorDescriptor>)> for CapabilityMapping
where
    P: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, Vec<ImplementorDescriptor>)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (package, implementors) in iter {
            mapping.insert(package, implementors);
        }
        mapping
    }
}

impl IntoIterator for CapabilityMapping {
    type Item = (String, Vec<ImplementorDescriptor>);
    type IntoIter = IntoIter<String, Vec<ImplementorDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.into_iter()
    }
}

impl<'a> IntoIterator for &'a CapabilityMapping {
    type Item = (&'a String, &'a Vec<ImplementorDescriptor>);
    type IntoIter = Iter<'a, String, Vec<ImplementorDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

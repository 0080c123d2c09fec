// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attribute model for batch status entries.
//!
//! An attribute is a `(name, optional resource, value)` triple. Lists keep
//! insertion order so aggregated replies stay stable across merges.

use serde::{Deserialize, Serialize};

/// Per-state job counts, e.g. `"Transit:0 Queued:4 Running:9 "`.
pub const ATTR_STATE_COUNT: &str = "state_count";
/// Total job count across all states.
pub const ATTR_TOTAL_JOBS: &str = "total_jobs";
/// Resource-qualified assigned-resource totals.
pub const ATTR_RESC_ASSIGNED: &str = "resources_assigned";
/// Synthetic attribute naming the endpoint a reply entity came from.
pub const ATTR_SERVER_INDEX: &str = "server_index";

/// A single attribute of a status entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), resource: None, value: value.into() }
    }

    pub fn with_resource(
        name: impl Into<String>,
        resource: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), resource: Some(resource.into()), value: value.into() }
    }

    /// True when this attribute matches a name and optional resource
    /// qualifier. A `None` resource only matches unqualified attributes.
    pub fn matches(&self, name: &str, resource: Option<&str>) -> bool {
        self.name == name && self.resource.as_deref() == resource
    }
}

/// Ordered attribute list attached to a status entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrList(Vec<Attr>);

impl AttrList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append an attribute, keeping whatever is already present.
    pub fn push(&mut self, attr: Attr) {
        self.0.push(attr);
    }

    /// Insert an attribute ahead of everything else.
    pub fn prepend(&mut self, attr: Attr) {
        self.0.insert(0, attr);
    }

    /// First attribute with the given name, regardless of resource.
    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Attr> {
        self.0.iter_mut().find(|a| a.name == name)
    }

    /// Attribute with the given name and resource qualifier.
    pub fn get_resource(&self, name: &str, resource: &str) -> Option<&Attr> {
        self.0.iter().find(|a| a.matches(name, Some(resource)))
    }

    pub fn get_resource_mut(&mut self, name: &str, resource: &str) -> Option<&mut Attr> {
        self.0.iter_mut().find(|a| a.matches(name, Some(resource)))
    }

    /// Shorthand for the value of the first attribute with this name.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|a| a.value.as_str())
    }

    /// Update the first matching attribute or append a new one.
    pub fn set(&mut self, attr: Attr) {
        match self.0.iter_mut().find(|a| a.matches(&attr.name, attr.resource.as_deref())) {
            Some(existing) => existing.value = attr.value,
            None => self.0.push(attr),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attr> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Attr> {
        self.0.iter_mut()
    }
}

impl FromIterator<Attr> for AttrList {
    fn from_iter<T: IntoIterator<Item = Attr>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for AttrList {
    type Item = Attr;
    type IntoIter = std::vec::IntoIter<Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttrList {
    type Item = &'a Attr;
    type IntoIter = std::slice::Iter<'a, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
#[path = "attr_tests.rs"]
mod tests;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device properties.
//!
//! The wallbox exposes its settings and measurements as a flat list of
//! properties identified by opaque ids such as `2129_0`. Each property
//! belongs to one category and carries an arbitrary JSON value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single device property.
///
/// # Examples
///
/// ```
/// use alfen_lib::types::Property;
///
/// let json = r#"{"id":"2129_0","access":1,"type":5,"len":0,"cat":"generic","value":16}"#;
/// let prop: Property = serde_json::from_str(json).unwrap();
///
/// assert_eq!(prop.id, "2129_0");
/// assert_eq!(prop.category, "generic");
/// assert_eq!(prop.as_i64(), Some(16));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Opaque property identifier.
    pub id: String,
    /// Current value as reported by the device.
    #[serde(default)]
    pub value: Value,
    /// Category the property was fetched from.
    #[serde(rename = "cat", default)]
    pub category: String,
}

impl Property {
    /// Creates a property.
    #[must_use]
    pub fn new(id: impl Into<String>, value: impl Into<Value>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
            category: category.into(),
        }
    }

    /// Returns the value as an integer.
    ///
    /// Numeric strings are accepted since some firmware versions report
    /// integers as text.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns the value as a float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns true if the value equals 1, the device's boolean "on".
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.as_i64() == Some(1)
    }
}

/// One page of a paged category fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyPage {
    /// Properties contained in this page.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Total number of properties in the category.
    #[serde(default)]
    pub total: usize,
}

/// Ordered collection of properties.
///
/// Lookups are linear scans; the first property with a matching id wins.
/// Device property counts are in the dozens, not thousands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyList(Vec<Property>);

impl PropertyList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first property with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.id == id)
    }

    /// Returns true if a property with the given id is present.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replaces the value of the first property with the given id.
    ///
    /// Unknown ids are ignored. Returns true if a property was patched.
    pub fn patch(&mut self, id: &str, value: Value) -> bool {
        match self.0.iter_mut().find(|p| p.id == id) {
            Some(prop) => {
                prop.value = value;
                true
            }
            None => false,
        }
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the list holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the properties in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.0.iter()
    }

    /// Removes every property.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<Property>> for PropertyList {
    fn from(value: Vec<Property>) -> Self {
        Self(value)
    }
}

impl FromIterator<Property> for PropertyList {
    fn from_iter<T: IntoIterator<Item = Property>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

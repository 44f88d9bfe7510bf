// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::transaction::TransactionCursor;
use crate::types::{LicenseSet, Property, PropertyList};

/// Property that holds the number of sockets.
pub(crate) const SOCKET_COUNT_ID: &str = "205E_0";
/// Property that holds the license bitmask.
pub(crate) const LICENSES_ID: &str = "21A2_0";

/// Tracked state of an Alfen wallbox.
///
/// The property list is replaced wholesale at the end of every successful
/// refresh and patched in place by single-value reads and writes. The
/// socket count and license set are recomputed from it by
/// [`derive_facts`](Self::derive_facts).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceState {
    properties: PropertyList,
    socket_count: u8,
    licenses: LicenseSet,
    transactions: TransactionCursor,
    last_refresh: Option<DateTime<Utc>>,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            properties: PropertyList::new(),
            socket_count: 1,
            licenses: LicenseSet::default(),
            transactions: TransactionCursor::new(),
            last_refresh: None,
        }
    }
}

impl DeviceState {
    /// Creates an empty state with one socket and no licenses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Properties ==========

    /// Returns every known property, static categories first.
    #[must_use]
    pub fn properties(&self) -> &PropertyList {
        &self.properties
    }

    /// Returns the first property with the given id.
    #[must_use]
    pub fn property(&self, id: &str) -> Option<&Property> {
        self.properties.get(id)
    }

    /// Returns the raw value of a property.
    #[must_use]
    pub fn value(&self, id: &str) -> Option<&Value> {
        self.property(id).map(|p| &p.value)
    }

    /// Returns true if the property exists and its value is 1.
    #[must_use]
    pub fn is_on(&self, id: &str) -> bool {
        self.property(id).is_some_and(Property::is_on)
    }

    /// Replaces the property list and records the refresh time.
    pub fn replace_properties(&mut self, properties: impl Into<PropertyList>) {
        self.properties = properties.into();
        self.last_refresh = Some(Utc::now());
    }

    /// Patches the first property with the given id.
    ///
    /// Returns false if no property has that id.
    pub fn patch(&mut self, id: &str, value: Value) -> bool {
        self.properties.patch(id, value)
    }

    /// Drops every property.
    pub fn clear_properties(&mut self) {
        self.properties.clear();
    }

    // ========== Derived facts ==========

    /// Returns the number of sockets, 1 unless reported otherwise.
    #[must_use]
    pub fn socket_count(&self) -> u8 {
        self.socket_count
    }

    /// Returns the decoded license set.
    #[must_use]
    pub fn licenses(&self) -> LicenseSet {
        self.licenses
    }

    /// Recomputes the socket count and license set from the properties.
    pub fn derive_facts(&mut self) {
        self.socket_count = self
            .property(SOCKET_COUNT_ID)
            .and_then(Property::as_i64)
            .and_then(|n| u8::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);

        self.licenses = self
            .property(LICENSES_ID)
            .and_then(Property::as_i64)
            .and_then(|bits| u64::try_from(bits).ok())
            .map(LicenseSet::from_bits)
            .unwrap_or_default();
    }

    // ========== Transactions ==========

    /// Returns the transaction log cursor.
    #[must_use]
    pub fn transactions(&self) -> &TransactionCursor {
        &self.transactions
    }

    /// Replaces the transaction log cursor.
    pub fn set_transactions(&mut self, cursor: TransactionCursor) {
        self.transactions = cursor;
    }

    /// Returns when the property list was last replaced.
    #[must_use]
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }
}

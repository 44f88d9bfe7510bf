// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Config entry diagnostics.

use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::device::DeviceInfo;
use crate::error::{Error, ParseError};
use crate::types::{Category, LicenseSet, PropertyList};

/// Snapshot of everything useful when reporting a problem with a wallbox.
///
/// The password is never included.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// Device id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Device info, or the generic fallback.
    pub info: DeviceInfo,
    /// Whether automatic re-login is suppressed.
    pub keep_logout: bool,
    /// Number of sockets.
    pub number_socket: u8,
    /// Enabled licenses.
    pub licenses: LicenseSet,
    /// Categories fetched on every poll.
    pub category_options: Vec<Category>,
    /// Last committed property list.
    pub properties: PropertyList,
}

impl Diagnostics {
    /// Collects diagnostics from a coordinator.
    #[must_use]
    pub fn collect(coordinator: &Coordinator) -> Self {
        let device = coordinator.device();
        let (number_socket, licenses, properties) = device.with_state(|state| {
            (
                state.socket_count(),
                state.licenses(),
                state.properties().clone(),
            )
        });
        Self {
            id: device.id().to_string(),
            name: device.name(),
            info: device.info(),
            keep_logout: device.is_logged_out(),
            number_socket,
            licenses,
            category_options: coordinator.options().refresh_categories,
            properties,
        }
    }

    /// Serializes the dump as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Parse(ParseError::Json(e)))
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switches for boolean device settings.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::device::ids;
use crate::error::Error;

use super::entity_name;

/// Static description of a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchDescription {
    /// Key, unique per device.
    pub key: &'static str,
    /// Display name without the device name.
    pub name: &'static str,
    /// Property holding the 0/1 setting.
    pub property_id: &'static str,
}

/// Every switch of a wallbox.
pub const SWITCHES: &[SwitchDescription] = &[
    SwitchDescription {
        key: "lb_enable_phase_switching",
        name: "Load Balancing Enable Phase Switching",
        property_id: ids::PHASE_SWITCHING,
    },
    SwitchDescription {
        key: "dp_light_auto_dim",
        name: "Display Light Auto Dim",
        property_id: "2061_1",
    },
    SwitchDescription {
        key: "lb_solar_charging_boost",
        name: "Solar Charging Boost",
        property_id: "3280_4",
    },
    SwitchDescription {
        key: "auth_white_list",
        name: "Auth. Whitelist",
        property_id: "213B_0",
    },
    SwitchDescription {
        key: "auth_local_list",
        name: "Auth. Local List",
        property_id: "213D_0",
    },
    SwitchDescription {
        key: "auth_restart_after_power_outage",
        name: "Auth. Restart after Power Outage",
        property_id: "215E_0",
    },
    SwitchDescription {
        key: "auth_remote_transaction_request",
        name: "Auth. Remote Transaction requests",
        property_id: "209B_0",
    },
    SwitchDescription {
        key: "proxy_enabled",
        name: "Proxy Enabled",
        property_id: "2117_0",
    },
];

/// A switch bound to a coordinator.
///
/// Turning a switch on or off writes the property and then polls the
/// wallbox, so the state reflects what the firmware accepted.
#[derive(Debug, Clone)]
pub struct AlfenSwitch {
    coordinator: Arc<Coordinator>,
    description: &'static SwitchDescription,
    unique_id: String,
    name: String,
}

impl AlfenSwitch {
    /// Binds a description to a coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, description: &'static SwitchDescription) -> Self {
        let device = coordinator.device();
        let unique_id = format!("{}_{}", device.id(), description.key);
        let name = entity_name(device, description.name);
        Self {
            coordinator,
            description,
            unique_id,
            name,
        }
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &'static SwitchDescription {
        self.description
    }

    /// Returns `<device id>_<key>`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns `<device name> <name>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true while the property is known.
    #[must_use]
    pub fn available(&self) -> bool {
        self.coordinator
            .device()
            .with_state(|state| state.property(self.description.property_id).is_some())
    }

    /// Returns true if the property value is 1.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.coordinator
            .device()
            .with_state(|state| state.is_on(self.description.property_id))
    }

    /// Returns the property category as an extra attribute.
    #[must_use]
    pub fn extra_attributes(&self) -> Option<BTreeMap<&'static str, String>> {
        self.coordinator.device().with_state(|state| {
            state
                .property(self.description.property_id)
                .map(|p| BTreeMap::from([("category", p.category.clone())]))
        })
    }

    /// Writes 1 and refreshes.
    ///
    /// # Errors
    ///
    /// Returns error if the write or the following refresh fails.
    pub async fn turn_on(&self) -> Result<(), Error> {
        self.write(true).await
    }

    /// Writes 0 and refreshes.
    ///
    /// # Errors
    ///
    /// Returns error if the write or the following refresh fails.
    pub async fn turn_off(&self) -> Result<(), Error> {
        self.write(false).await
    }

    async fn write(&self, on: bool) -> Result<(), Error> {
        self.coordinator
            .device()
            .set_value(self.description.property_id, u8::from(on))
            .await?;
        self.coordinator.refresh().await
    }

    /// Enables phase switching, then turns this switch on.
    ///
    /// # Errors
    ///
    /// Returns error if a write or the refresh fails.
    pub async fn enable_phase_switching(&self) -> Result<(), Error> {
        self.coordinator.device().set_phase_switching(true).await?;
        self.turn_on().await
    }

    /// Disables phase switching, then turns this switch off.
    ///
    /// # Errors
    ///
    /// Returns error if a write or the refresh fails.
    pub async fn disable_phase_switching(&self) -> Result<(), Error> {
        self.coordinator.device().set_phase_switching(false).await?;
        self.turn_off().await
    }
}

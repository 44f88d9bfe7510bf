// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entities exposed to a home automation host.
//!
//! Each entity type is a static description (key, display name, source
//! property) plus a thin adapter bound to a [`Coordinator`]. Adapters read
//! the latest committed [`DeviceState`](crate::state::DeviceState) on demand
//! and forward commands to the [`Device`](crate::Device).
//!
//! | Platform | Descriptions | Adapter |
//! |---|---|---|
//! | binary sensor | [`BINARY_SENSORS`] | [`AlfenBinarySensor`] |
//! | switch | [`SWITCHES`] | [`AlfenSwitch`] |
//! | button | [`BUTTONS`] | [`AlfenButton`] |
//! | sensor | [`TRANSACTION_FIELDS`] | [`TransactionSensor`] |

mod binary_sensor;
mod button;
mod sensor;
mod switch;

pub use binary_sensor::{AlfenBinarySensor, BINARY_SENSORS, BinarySensorDescription, BinarySensorSource};
pub use button::{AlfenButton, BUTTONS, ButtonAction, ButtonDescription};
pub use sensor::{SensorValue, TRANSACTION_FIELDS, TransactionField, TransactionSensor};
pub use switch::{AlfenSwitch, SWITCHES, SwitchDescription};

use std::sync::Arc;

use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::device::Device;

/// Integration domain used in device identifiers.
pub const DOMAIN: &str = "alfen_wallbox";

/// Manufacturer reported for every wallbox.
pub const MANUFACTURER: &str = "Alfen";

/// Device registry entry shared by all entities of one wallbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    /// `(domain, device name)` pairs identifying the device.
    pub identifiers: Vec<(String, String)>,
    /// Always `Alfen`.
    pub manufacturer: String,
    /// Model name.
    pub model: String,
    /// Device name.
    pub name: String,
    /// Firmware version.
    pub sw_version: String,
}

impl DeviceIdentity {
    /// Builds the identity block of a device.
    #[must_use]
    pub fn for_device(device: &Device) -> Self {
        let info = device.info();
        let name = device.name();
        Self {
            identifiers: vec![(DOMAIN.to_string(), name.clone())],
            manufacturer: MANUFACTURER.to_string(),
            model: info.model,
            name,
            sw_version: info.firmware_version,
        }
    }
}

/// Creates every entity for one coordinator.
#[derive(Debug)]
pub struct Entities {
    /// Binary sensors.
    pub binary_sensors: Vec<AlfenBinarySensor>,
    /// Switches.
    pub switches: Vec<AlfenSwitch>,
    /// Buttons.
    pub buttons: Vec<AlfenButton>,
    /// Transaction sensors for every socket.
    pub sensors: Vec<TransactionSensor>,
}

impl Entities {
    /// Instantiates all descriptions against `coordinator`.
    ///
    /// Transaction sensors are created for the socket count known at call
    /// time, so call this after the first refresh.
    #[must_use]
    pub fn new(coordinator: &Arc<Coordinator>) -> Self {
        Self {
            binary_sensors: BINARY_SENSORS
                .iter()
                .map(|d| AlfenBinarySensor::new(Arc::clone(coordinator), d))
                .collect(),
            switches: SWITCHES
                .iter()
                .map(|d| AlfenSwitch::new(Arc::clone(coordinator), d))
                .collect(),
            buttons: BUTTONS
                .iter()
                .map(|d| AlfenButton::new(Arc::clone(coordinator), d))
                .collect(),
            sensors: TransactionSensor::for_all_sockets(coordinator),
        }
    }
}

/// `"<device name> <entity name>"`.
fn entity_name(device: &Device, name: &str) -> String {
    format!("{} {name}", device.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_uses_name_and_generic_info() {
        let device = Device::http("192.0.2.1")
            .with_name("garage")
            .build_without_probe()
            .unwrap();

        let identity = DeviceIdentity::for_device(&device);
        assert_eq!(
            identity.identifiers,
            vec![("alfen_wallbox".to_string(), "garage".to_string())]
        );
        assert_eq!(identity.manufacturer, "Alfen");
        assert_eq!(identity.model, "Generic Alfen Wallbox");
        assert_eq!(identity.sw_version, "?");
    }
}

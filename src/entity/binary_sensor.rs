// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary sensors for boolean properties and license flags.

use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::state::DeviceState;
use crate::types::License;

use super::entity_name;

/// Where a binary sensor reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinarySensorSource {
    /// On when the property value is 1; unavailable while absent.
    Property(&'static str),
    /// On when any of the licenses is enabled; always available.
    License(&'static [License]),
}

/// Static description of a binary sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinarySensorDescription {
    /// Key, unique per device.
    pub key: &'static str,
    /// Display name without the device name.
    pub name: &'static str,
    /// Value source.
    pub source: BinarySensorSource,
}

const fn license(
    key: &'static str,
    name: &'static str,
    licenses: &'static [License],
) -> BinarySensorDescription {
    BinarySensorDescription {
        key,
        name,
        source: BinarySensorSource::License(licenses),
    }
}

/// Every binary sensor of a wallbox.
///
/// A Smart Charging Network license implies both load balancing modes.
pub const BINARY_SENSORS: &[BinarySensorDescription] = &[
    BinarySensorDescription {
        key: "system_date_light_savings",
        name: "System Daylight Savings",
        source: BinarySensorSource::Property("205B_0"),
    },
    license(
        "license_scn",
        "License Smart Charging Network",
        &[License::SmartChargingNetwork],
    ),
    license(
        "license_active_loadbalancing",
        "License Active Loadbalancing",
        &[License::SmartChargingNetwork, License::ActiveLoadBalancing],
    ),
    license(
        "license_static_loadbalancing",
        "License Static Loadbalancing",
        &[License::SmartChargingNetwork, License::StaticLoadBalancing],
    ),
    license(
        "license_high_power_sockets",
        "License 32A Output per Socket",
        &[License::HighPowerSockets],
    ),
    license(
        "license_rfid_reader",
        "License RFID Reader",
        &[License::RfidReader],
    ),
    license(
        "license_personalized_display",
        "License Personalized Display",
        &[License::PersonalizedDisplay],
    ),
    license(
        "license_mobile_3G_4G",
        "License Mobile 3G & 4G",
        &[License::Mobile],
    ),
    license(
        "license_giro_e",
        "License Giro-e Payment",
        &[License::GiroePayment],
    ),
];

impl BinarySensorDescription {
    /// Returns whether the sensor has a value in `state`.
    #[must_use]
    pub fn available(&self, state: &DeviceState) -> bool {
        match self.source {
            BinarySensorSource::Property(id) => state.property(id).is_some(),
            BinarySensorSource::License(_) => true,
        }
    }

    /// Returns whether the sensor is on in `state`.
    #[must_use]
    pub fn is_on(&self, state: &DeviceState) -> bool {
        match self.source {
            BinarySensorSource::Property(id) => state.is_on(id),
            BinarySensorSource::License(licenses) => {
                let enabled = state.licenses();
                licenses.iter().any(|l| enabled.contains(*l))
            }
        }
    }
}

/// A binary sensor bound to a coordinator.
#[derive(Debug, Clone)]
pub struct AlfenBinarySensor {
    coordinator: Arc<Coordinator>,
    description: &'static BinarySensorDescription,
    unique_id: String,
    name: String,
}

impl AlfenBinarySensor {
    /// Binds a description to a coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, description: &'static BinarySensorDescription) -> Self {
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
    pub fn description(&self) -> &'static BinarySensorDescription {
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

    /// Returns whether the sensor currently has a value.
    #[must_use]
    pub fn available(&self) -> bool {
        self.coordinator
            .device()
            .with_state(|state| self.description.available(state))
    }

    /// Returns whether the sensor is currently on.
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.coordinator
            .device()
            .with_state(|state| self.description.is_on(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Property;

    fn description(key: &str) -> &'static BinarySensorDescription {
        BINARY_SENSORS.iter().find(|d| d.key == key).unwrap()
    }

    fn state_with_licenses(bits: u64) -> DeviceState {
        let mut state = DeviceState::new();
        state.replace_properties(vec![Property::new("21A2_0", bits, "generic")]);
        state.derive_facts();
        state
    }

    #[test]
    fn keys_are_unique() {
        let mut keys: Vec<_> = BINARY_SENSORS.iter().map(|d| d.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), BINARY_SENSORS.len());
    }

    #[test]
    fn smart_charging_network_implies_load_balancing() {
        let state = state_with_licenses(License::SmartChargingNetwork.bit());
        assert!(description("license_scn").is_on(&state));
        assert!(description("license_active_loadbalancing").is_on(&state));
        assert!(description("license_static_loadbalancing").is_on(&state));
        assert!(!description("license_rfid_reader").is_on(&state));
    }

    #[test]
    fn single_load_balancing_license() {
        let state = state_with_licenses(License::StaticLoadBalancing.bit());
        assert!(!description("license_scn").is_on(&state));
        assert!(!description("license_active_loadbalancing").is_on(&state));
        assert!(description("license_static_loadbalancing").is_on(&state));
    }

    #[test]
    fn property_sensor_availability() {
        let sensor = description("system_date_light_savings");
        let mut state = DeviceState::new();
        assert!(!sensor.available(&state));
        assert!(!sensor.is_on(&state));

        state.replace_properties(vec![Property::new("205B_0", 1, "generic")]);
        assert!(sensor.available(&state));
        assert!(sensor.is_on(&state));
    }

    #[test]
    fn license_sensors_are_always_available() {
        assert!(description("license_giro_e").available(&DeviceState::new()));
    }
}

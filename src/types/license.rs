// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! License flags decoded from the `21A2_0` bitmask property.

use std::fmt;

use serde::Serialize;

/// An optional feature unlocked on the wallbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum License {
    /// Smart Charging Network (implies both load balancing modes).
    SmartChargingNetwork,
    /// Static load balancing.
    StaticLoadBalancing,
    /// Active load balancing.
    ActiveLoadBalancing,
    /// 32 A output per socket.
    HighPowerSockets,
    /// RFID reader.
    RfidReader,
    /// Personalized display.
    PersonalizedDisplay,
    /// Mobile 3G and 4G modem.
    Mobile,
    /// Giro-e payment.
    GiroePayment,
    /// QR code payment.
    QrCodePayment,
    /// Exposure of smart meter data.
    ExposeSmartMeterData,
}

impl License {
    /// Every known license, in bit order.
    pub const ALL: [Self; 10] = [
        Self::SmartChargingNetwork,
        Self::StaticLoadBalancing,
        Self::ActiveLoadBalancing,
        Self::HighPowerSockets,
        Self::RfidReader,
        Self::PersonalizedDisplay,
        Self::Mobile,
        Self::GiroePayment,
        Self::QrCodePayment,
        Self::ExposeSmartMeterData,
    ];

    /// Returns the bit this license occupies in the bitmask.
    #[must_use]
    pub const fn bit(&self) -> u64 {
        match self {
            Self::SmartChargingNetwork => 1,
            Self::StaticLoadBalancing => 2,
            Self::ActiveLoadBalancing => 4,
            Self::HighPowerSockets => 8,
            Self::RfidReader => 16,
            Self::PersonalizedDisplay => 32,
            Self::Mobile => 64,
            Self::GiroePayment => 128,
            Self::QrCodePayment => 256,
            Self::ExposeSmartMeterData => 512,
        }
    }

    /// Returns the human readable license name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SmartChargingNetwork => "Smart Charging Network",
            Self::StaticLoadBalancing => "Static Load Balancing",
            Self::ActiveLoadBalancing => "Active Load Balancing",
            Self::HighPowerSockets => "32A Output per Socket",
            Self::RfidReader => "RFID Reader",
            Self::PersonalizedDisplay => "Personalized Display",
            Self::Mobile => "Mobile 3G & 4G",
            Self::GiroePayment => "Giro-e Payment",
            Self::QrCodePayment => "QR Code Payment",
            Self::ExposeSmartMeterData => "Expose Smart Meter Data",
        }
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of licenses enabled on the wallbox.
///
/// # Examples
///
/// ```
/// use alfen_lib::types::{License, LicenseSet};
///
/// let set = LicenseSet::from_bits(1 | 16);
/// assert!(set.contains(License::SmartChargingNetwork));
/// assert!(set.contains(License::RfidReader));
/// assert!(!set.contains(License::Mobile));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LicenseSet(u64);

impl LicenseSet {
    /// Decodes a license bitmask. Unknown bits are kept but not named.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Returns the raw bitmask.
    #[must_use]
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// Returns true if the license bit is set.
    #[must_use]
    pub const fn contains(&self, license: License) -> bool {
        self.0 & license.bit() != 0
    }

    /// Returns true if no known license is enabled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterates over the enabled known licenses.
    pub fn iter(&self) -> impl Iterator<Item = License> + '_ {
        License::ALL.into_iter().filter(|l| self.contains(*l))
    }
}

impl Serialize for LicenseSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter().map(|l| l.name()))
    }
}

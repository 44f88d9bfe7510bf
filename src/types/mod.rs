// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for Alfen wallbox control.
//!
//! Setter inputs are validated at construction time, so an out-of-range
//! value never reaches the network.
//!
//! # Types
//!
//! - [`Property`] / [`PropertyList`] - Device properties as returned by `/api/prop`
//! - [`Category`] - Property categories known to the firmware
//! - [`License`] / [`LicenseSet`] - Decoded license bitmask
//! - [`CurrentLimit`] - Charging current limit (1-32 A)
//! - [`GreenShare`] - Solar green share (0-100 %)
//! - [`ComfortPower`] - Solar comfort charging power (1400-5000 W)
//! - [`Phase`] - Single-phase selection (L1, L2, L3)

mod category;
mod license;
mod limits;
mod phase;
mod property;

pub use category::Category;
pub use license::{License, LicenseSet};
pub use limits::{ComfortPower, CurrentLimit, GreenShare};
pub use phase::Phase;
pub use property::{Property, PropertyList, PropertyPage};

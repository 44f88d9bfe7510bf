// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A property category known to the wallbox firmware.
///
/// Categories selected in the options are refreshed on every poll; all
/// others are fetched once and cached. [`Category::Transactions`] is not a
/// property category: selecting it enables parsing of the transaction log.
///
/// # Examples
///
/// ```
/// use alfen_lib::types::Category;
///
/// let cat: Category = "meter1".parse().unwrap();
/// assert_eq!(cat, Category::Meter1);
/// assert_eq!(Category::MbusTcp.as_str(), "MbusTCP");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    /// General settings.
    Generic,
    /// Additional general settings.
    Generic2,
    /// Accelerometer (tilt) readings.
    Accelero,
    /// Temperatures.
    Temp,
    /// Socket 1 meter.
    Meter1,
    /// Socket 2 meter.
    Meter2,
    /// Smart meter.
    Meter4,
    /// Charging state machine.
    States,
    /// OCPP backoffice settings.
    Ocpp,
    /// Modbus TCP settings.
    MbusTcp,
    /// Communication settings.
    Comm,
    /// Display settings.
    Display,
    /// LED settings.
    Leds,
    /// Transaction log (parsed, not fetched as properties).
    Transactions,
}

impl Category {
    /// Every category, in fetch order.
    pub const ALL: [Self; 14] = [
        Self::Generic,
        Self::Generic2,
        Self::Accelero,
        Self::Temp,
        Self::Meter1,
        Self::Meter2,
        Self::Meter4,
        Self::States,
        Self::Ocpp,
        Self::MbusTcp,
        Self::Comm,
        Self::Display,
        Self::Leds,
        Self::Transactions,
    ];

    /// Categories refreshed on every poll unless configured otherwise.
    pub const DEFAULT_REFRESH: [Self; 5] = [
        Self::Generic,
        Self::Generic2,
        Self::Meter1,
        Self::States,
        Self::Temp,
    ];

    /// Returns the name used in `/api/prop?cat=` queries.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Generic2 => "generic2",
            Self::Accelero => "accelero",
            Self::Temp => "temp",
            Self::Meter1 => "meter1",
            Self::Meter2 => "meter2",
            Self::Meter4 => "meter4",
            Self::States => "states",
            Self::Ocpp => "ocpp",
            Self::MbusTcp => "MbusTCP",
            Self::Comm => "comm",
            Self::Display => "display",
            Self::Leds => "leds",
            Self::Transactions => "transactions",
        }
    }

    /// Returns true if properties of this category come from `/api/prop`.
    #[must_use]
    pub const fn is_property_category(&self) -> bool {
        !matches!(self, Self::Transactions)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValueError::UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_every_category() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn parse_is_case_sensitive() {
        assert!("mbustcp".parse::<Category>().is_err());
        assert!("MbusTCP".parse::<Category>().is_ok());
    }

    #[test]
    fn transactions_is_not_a_property_category() {
        assert!(!Category::Transactions.is_property_category());
        assert!(Category::Meter4.is_property_category());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&vec![Category::MbusTcp, Category::Meter1]).unwrap();
        assert_eq!(json, r#"["MbusTCP","meter1"]"#);
        let back: Vec<Category> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Category::MbusTcp, Category::Meter1]);
    }
}

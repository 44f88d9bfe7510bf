// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Range-checked setter values.
//!
//! Each type rejects values the wallbox would clamp or silently ignore.

use std::fmt;

use crate::error::ValueError;

/// Charging current limit in Amperes (1-32).
///
/// # Examples
///
/// ```
/// use alfen_lib::types::CurrentLimit;
///
/// let limit = CurrentLimit::new(16).unwrap();
/// assert_eq!(limit.amps(), 16);
///
/// assert!(CurrentLimit::new(0).is_err());
/// assert!(CurrentLimit::new(33).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrentLimit(u8);

impl CurrentLimit {
    /// Lowest accepted limit.
    pub const MIN: Self = Self(1);
    /// Highest accepted limit.
    pub const MAX: Self = Self(32);

    /// Creates a current limit.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `amps` is below 1 or above 32.
    pub fn new(amps: u8) -> Result<Self, ValueError> {
        if amps < Self::MIN.0 || amps > Self::MAX.0 {
            return Err(ValueError::OutOfRange {
                min: i64::from(Self::MIN.0),
                max: i64::from(Self::MAX.0),
                actual: i64::from(amps),
            });
        }
        Ok(Self(amps))
    }

    /// Returns the limit in Amperes.
    #[must_use]
    pub const fn amps(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CurrentLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}A", self.0)
    }
}

impl TryFrom<u8> for CurrentLimit {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Share of solar power required before charging starts, in percent (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GreenShare(u8);

impl GreenShare {
    /// Creates a green share value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `percent` exceeds 100.
    pub fn new(percent: u8) -> Result<Self, ValueError> {
        if percent > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: i64::from(percent),
            });
        }
        Ok(Self(percent))
    }

    /// Returns the percentage.
    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for GreenShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Minimum charging power kept while in solar comfort mode, in Watts (1400-5000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComfortPower(u16);

impl ComfortPower {
    /// Lowest accepted power.
    pub const MIN: Self = Self(1400);
    /// Highest accepted power.
    pub const MAX: Self = Self(5000);

    /// Creates a comfort power value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `watts` is outside 1400-5000.
    pub fn new(watts: u16) -> Result<Self, ValueError> {
        if watts < Self::MIN.0 || watts > Self::MAX.0 {
            return Err(ValueError::OutOfRange {
                min: i64::from(Self::MIN.0),
                max: i64::from(Self::MAX.0),
                actual: i64::from(watts),
            });
        }
        Ok(Self(watts))
    }

    /// Returns the power in Watts.
    #[must_use]
    pub const fn watts(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ComfortPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}W", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_limit_bounds() {
        assert!(CurrentLimit::new(0).is_err());
        assert!(CurrentLimit::new(1).is_ok());
        assert!(CurrentLimit::new(32).is_ok());
        assert_eq!(
            CurrentLimit::new(33),
            Err(ValueError::OutOfRange {
                min: 1,
                max: 32,
                actual: 33
            })
        );
    }

    #[test]
    fn green_share_bounds() {
        assert!(GreenShare::new(0).is_ok());
        assert!(GreenShare::new(100).is_ok());
        assert!(GreenShare::new(101).is_err());
    }

    #[test]
    fn comfort_power_bounds() {
        assert!(ComfortPower::new(1399).is_err());
        assert_eq!(ComfortPower::new(1400).unwrap().watts(), 1400);
        assert_eq!(ComfortPower::new(5000).unwrap().watts(), 5000);
        assert!(ComfortPower::new(5001).is_err());
    }

    #[test]
    fn display_units() {
        assert_eq!(CurrentLimit::new(16).unwrap().to_string(), "16A");
        assert_eq!(GreenShare::new(40).unwrap().to_string(), "40%");
        assert_eq!(ComfortPower::new(2300).unwrap().to_string(), "2300W");
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Grid phase used for single-phase charging.
///
/// # Examples
///
/// ```
/// use alfen_lib::types::Phase;
///
/// let phase: Phase = "L2".parse().unwrap();
/// assert_eq!(phase, Phase::L2);
/// assert!("L4".parse::<Phase>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Phase 1.
    L1,
    /// Phase 2.
    L2,
    /// Phase 3.
    L3,
}

impl Phase {
    /// Returns the value written to the device.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L1" => Ok(Self::L1),
            "L2" => Ok(Self::L2),
            "L3" => Ok(Self::L3),
            other => Err(ValueError::InvalidPhase(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_phases() {
        assert_eq!("L1".parse::<Phase>().unwrap(), Phase::L1);
        assert_eq!("L3".parse::<Phase>().unwrap(), Phase::L3);
    }

    #[test]
    fn parse_rejects_lowercase_and_unknown() {
        assert!("l1".parse::<Phase>().is_err());
        assert!("".parse::<Phase>().is_err());
    }
}

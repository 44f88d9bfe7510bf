// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wallbox event types.

use crate::device::DeviceInfo;

/// Events emitted by a device and its coordinator.
///
/// Every event carries the device id (`alfen_<name>`) so that a single
/// subscriber can observe several wallboxes.
///
/// # Examples
///
/// ```
/// use alfen_lib::event::WallboxEvent;
///
/// let event = WallboxEvent::update_failed("alfen_garage", "timed out");
/// assert_eq!(event.device_id(), "alfen_garage");
/// assert!(event.is_failure());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum WallboxEvent {
    /// The device identity was fetched during setup.
    Connected {
        /// Device id.
        device_id: String,
        /// Identity reported by `/api/info`, or the generic placeholder.
        info: DeviceInfo,
    },

    /// A refresh completed and a new property snapshot was committed.
    Refreshed {
        /// Device id.
        device_id: String,
        /// Number of properties in the new snapshot.
        property_count: usize,
    },

    /// Setup or a refresh failed; entities should report unavailable.
    UpdateFailed {
        /// Device id.
        device_id: String,
        /// Failure description.
        error: String,
    },

    /// Options were changed; static categories will be refetched.
    OptionsUpdated {
        /// Device id.
        device_id: String,
    },

    /// An explicit login succeeded.
    LoggedIn {
        /// Device id.
        device_id: String,
    },

    /// The session was explicitly logged out; automatic re-login is off.
    LoggedOut {
        /// Device id.
        device_id: String,
    },
}

impl WallboxEvent {
    /// Returns the device id associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &str {
        match self {
            Self::Connected { device_id, .. }
            | Self::Refreshed { device_id, .. }
            | Self::UpdateFailed { device_id, .. }
            | Self::OptionsUpdated { device_id }
            | Self::LoggedIn { device_id }
            | Self::LoggedOut { device_id } => device_id,
        }
    }

    /// Returns `true` for setup or refresh failures.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::UpdateFailed { .. })
    }

    /// Returns `true` for login and logout events.
    #[must_use]
    pub fn is_session(&self) -> bool {
        matches!(self, Self::LoggedIn { .. } | Self::LoggedOut { .. })
    }

    /// Creates a connected event.
    #[must_use]
    pub fn connected(device_id: impl Into<String>, info: DeviceInfo) -> Self {
        Self::Connected {
            device_id: device_id.into(),
            info,
        }
    }

    /// Creates a refreshed event.
    #[must_use]
    pub fn refreshed(device_id: impl Into<String>, property_count: usize) -> Self {
        Self::Refreshed {
            device_id: device_id.into(),
            property_count,
        }
    }

    /// Creates an update failed event.
    #[must_use]
    pub fn update_failed(device_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self::UpdateFailed {
            device_id: device_id.into(),
            error: error.into(),
        }
    }

    /// Creates an options updated event.
    #[must_use]
    pub fn options_updated(device_id: impl Into<String>) -> Self {
        Self::OptionsUpdated {
            device_id: device_id.into(),
        }
    }

    /// Creates a logged in event.
    #[must_use]
    pub fn logged_in(device_id: impl Into<String>) -> Self {
        Self::LoggedIn {
            device_id: device_id.into(),
        }
    }

    /// Creates a logged out event.
    #[must_use]
    pub fn logged_out(device_id: impl Into<String>) -> Self {
        Self::LoggedOut {
            device_id: device_id.into(),
        }
    }
}

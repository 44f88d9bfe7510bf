// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Buttons for device commands.

use std::sync::Arc;

use crate::coordinator::Coordinator;
use crate::error::Error;

use super::entity_name;

/// What a button does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// `POST /api/cmd {"command": "reboot"}`.
    Reboot,
    /// Log out and stop automatic re-login.
    Logout,
    /// Log in and resume automatic re-login.
    Login,
    /// Poll immediately.
    ForceUpdate,
}

/// Static description of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonDescription {
    /// Key, unique per device.
    pub key: &'static str,
    /// Display name without the device name.
    pub name: &'static str,
    /// Action on press.
    pub action: ButtonAction,
}

/// Every button of a wallbox.
pub const BUTTONS: &[ButtonDescription] = &[
    ButtonDescription {
        key: "reboot_wallbox",
        name: "Reboot Wallbox",
        action: ButtonAction::Reboot,
    },
    ButtonDescription {
        key: "auth_logout",
        name: "HTTPS API Logout",
        action: ButtonAction::Logout,
    },
    ButtonDescription {
        key: "auth_login",
        name: "HTTPS API Login",
        action: ButtonAction::Login,
    },
    ButtonDescription {
        key: "wallbox_force_update",
        name: "Force Update",
        action: ButtonAction::ForceUpdate,
    },
];

/// A button bound to a coordinator.
#[derive(Debug, Clone)]
pub struct AlfenButton {
    coordinator: Arc<Coordinator>,
    description: &'static ButtonDescription,
    unique_id: String,
    name: String,
}

impl AlfenButton {
    /// Binds a description to a coordinator.
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, description: &'static ButtonDescription) -> Self {
        let device = coordinator.device();
        // Dash separator, unlike the other platforms.
        let unique_id = format!("{}-{}", device.id(), description.key);
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
    pub fn description(&self) -> &'static ButtonDescription {
        self.description
    }

    /// Returns `<device id>-<key>`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns `<device name> <name>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Performs the button's action.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying request or refresh fails.
    pub async fn press(&self) -> Result<(), Error> {
        tracing::debug!(button = self.description.key, "Button pressed");
        let device = self.coordinator.device();
        match self.description.action {
            ButtonAction::Reboot => device.reboot().await,
            ButtonAction::Logout => device.logout().await,
            ButtonAction::Login => device.login().await,
            ButtonAction::ForceUpdate => self.coordinator.refresh().await,
        }
    }
}

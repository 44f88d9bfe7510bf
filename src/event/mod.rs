// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for wallbox lifecycle and refresh notifications.
//!
//! The [`EventBus`] uses tokio's broadcast channel so that any number of
//! entities or host adapters can observe the coordinator without polling it.
//!
//! # Examples
//!
//! ```
//! use alfen_lib::event::{EventBus, WallboxEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(WallboxEvent::logged_in("alfen_garage"));
//! ```

mod event_bus;
mod wallbox_event;

pub use event_bus::EventBus;
pub use wallbox_event::WallboxEvent;

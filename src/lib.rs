// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `alfen_lib` - A Rust library to poll and control Alfen EV wallboxes.
//!
//! The wallbox exposes a local HTTPS API with cookie sessions. This library
//! logs in, pages through property categories, parses the charging
//! transaction log and writes settings back, and wraps all of that in a
//! polling coordinator a home automation host can drive.
//!
//! # Supported Features
//!
//! - **Session handling**: login/logout, transparent re-login on HTTP 401
//! - **Property polling**: paged category fetch, static category caching
//! - **Settings**: current limit, phase, phase switching, solar charging, RFID
//! - **Transactions**: per-socket start/stop/meter values from the log
//! - **Host glue**: coordinator, entities, diagnostics, persisted config
//!
//! # Quick Start
//!
//! ## Direct Device Access
//!
//! ```no_run
//! use alfen_lib::Device;
//!
//! #[tokio::main]
//! async fn main() -> alfen_lib::Result<()> {
//!     // Fetches /api/info while building
//!     let device = Device::http("192.168.1.50")
//!         .with_credentials("admin", "secret")
//!         .build()
//!         .await?;
//!
//!     device.login().await?;
//!     device.refresh().await?;
//!     device.set_current_limit(16).await?;
//!
//!     println!("{} has {} socket(s)", device.name(), device.number_of_sockets());
//!     Ok(())
//! }
//! ```
//!
//! ## Polling Coordinator
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use alfen_lib::Coordinator;
//! use alfen_lib::config::{ConfigEntry, EntryData};
//!
//! #[tokio::main]
//! async fn main() -> alfen_lib::Result<()> {
//!     let entry = ConfigEntry::new(EntryData::new("192.168.1.50", "garage", "secret"));
//!     let coordinator = Arc::new(Coordinator::from_entry(&entry)?);
//!
//!     coordinator.setup().await?;
//!     let handle = coordinator.spawn();
//!
//!     let mut state = coordinator.watch_state();
//!     while state.changed().await.is_ok() {
//!         println!("{} properties", state.borrow().properties().len());
//!     }
//!
//!     handle.shutdown().await;
//!     coordinator.unload().await
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod device;
pub mod diagnostics;
pub mod entity;
pub mod error;
pub mod event;
pub mod protocol;
pub mod state;
pub mod transaction;
pub mod types;

pub use config::{ConfigEntry, EntryData, EntryOptions};
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use device::{Device, DeviceBuilder, DeviceInfo, RefreshOutcome};
pub use diagnostics::Diagnostics;
pub use error::{ConfigError, DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{EventBus, WallboxEvent};
pub use protocol::HttpConfig;
pub use state::DeviceState;
pub use types::{
    Category, ComfortPower, CurrentLimit, GreenShare, License, LicenseSet, Phase, Property,
    PropertyList,
};

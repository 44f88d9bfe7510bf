// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state snapshot.
//!
//! [`DeviceState`] is what the presentation adapters read: the committed
//! property list of the last successful refresh, the facts derived from it,
//! and the transaction log cursor.
//!
//! # Examples
//!
//! ```
//! use alfen_lib::state::DeviceState;
//! use alfen_lib::types::{License, Property};
//!
//! let mut state = DeviceState::new();
//! state.replace_properties(vec![
//!     Property::new("205E_0", 2, "generic2"),
//!     Property::new("21A2_0", 1 | 16, "generic"),
//! ]);
//! state.derive_facts();
//!
//! assert_eq!(state.socket_count(), 2);
//! assert!(state.licenses().contains(License::RfidReader));
//! ```

mod device_state;

pub use device_state::DeviceState;

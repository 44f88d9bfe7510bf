// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for wallbox events.

use tokio::sync::broadcast;

use super::WallboxEvent;

/// Events buffered per subscriber before the oldest are dropped.
const CAPACITY: usize = 64;

/// Fan-out of [`WallboxEvent`]s to any number of subscribers.
///
/// Publishing never blocks or fails. A subscriber that falls more than
/// 64 events behind receives `RecvError::Lagged` and skips ahead.
///
/// ```
/// use alfen_lib::event::{EventBus, WallboxEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(WallboxEvent::refreshed("alfen_garage", 42));
/// assert_eq!(rx.try_recv().unwrap().device_id(), "alfen_garage");
/// ```
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<WallboxEvent>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CAPACITY);
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WallboxEvent> {
        self.sender.subscribe()
    }

    /// Sends `event` to every current subscriber.
    pub fn publish(&self, event: WallboxEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

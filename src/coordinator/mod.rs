// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Timed polling of one wallbox.
//!
//! The [`Coordinator`] drives [`Device::refresh`] on a fixed interval, bounds
//! every poll by the configured timeout, and re-derives the socket count and
//! license set afterwards. It is the only place that reports
//! [`Error::UpdateFailed`]; a failed poll marks the wallbox unavailable and
//! the loop simply tries again on the next tick.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use alfen_lib::config::{ConfigEntry, EntryData};
//! use alfen_lib::Coordinator;
//!
//! # async fn example() -> alfen_lib::Result<()> {
//! let entry = ConfigEntry::new(EntryData::new("192.168.1.50", "garage", "secret"));
//! let coordinator = Arc::new(Coordinator::from_entry(&entry)?);
//!
//! coordinator.setup().await?;
//! let handle = coordinator.spawn();
//!
//! // ... later
//! handle.shutdown().await;
//! coordinator.unload().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::{ConfigEntry, EntryOptions};
use crate::device::{Device, RefreshOutcome};
use crate::error::Error;
use crate::event::WallboxEvent;
use crate::state::DeviceState;

/// Polls one wallbox and publishes the results.
#[derive(Debug)]
pub struct Coordinator {
    device: Arc<Device>,
    options: RwLock<EntryOptions>,
    available: AtomicBool,
    state_tx: watch::Sender<DeviceState>,
}

impl Coordinator {
    /// Creates a coordinator for an existing device.
    ///
    /// The device's dynamic categories are replaced by those in `options`.
    #[must_use]
    pub fn new(device: Arc<Device>, options: EntryOptions) -> Self {
        device.set_dynamic_categories(options.refresh_categories.clone());
        let (state_tx, _) = watch::channel(device.state());
        Self {
            device,
            options: RwLock::new(options),
            available: AtomicBool::new(false),
            state_tx,
        }
    }

    /// Creates a coordinator and its device from a persisted entry.
    ///
    /// No request is sent; call [`setup`](Self::setup) next.
    ///
    /// # Errors
    ///
    /// Returns error if the entry is invalid or the HTTP client cannot be
    /// created.
    pub fn from_entry(entry: &ConfigEntry) -> Result<Self, Error> {
        entry.validate()?;
        let device = entry.device_builder().build_without_probe()?;
        Ok(Self::new(Arc::new(device), entry.options.clone()))
    }

    /// Returns the polled device.
    #[must_use]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> EntryOptions {
        self.options.read().clone()
    }

    /// Returns the time between polls.
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        self.options.read().scan_interval()
    }

    /// Returns false until the first successful poll and after any failed
    /// one.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Subscribes to device and coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WallboxEvent> {
        self.device.events().subscribe()
    }

    /// Creates a watch receiver for the state after each poll.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<DeviceState> {
        self.state_tx.subscribe()
    }

    /// Connects to the wallbox and runs the first poll.
    ///
    /// Both steps are bounded by the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpdateFailed`] if the wallbox cannot be reached or
    /// the first poll fails.
    pub async fn setup(&self) -> Result<(), Error> {
        let timeout = self.options.read().timeout();

        match tokio::time::timeout(timeout, self.device.connect()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                tracing::debug!(host = self.device.host(), error = %e, "Connection failed");
                return Err(self.fail("Error communicating with API".to_string()));
            }
            Err(_) => {
                tracing::debug!(host = self.device.host(), "Connection timed out");
                return Err(self.fail("Error communicating with API".to_string()));
            }
        }

        self.refresh().await
    }

    /// Runs one poll.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UpdateFailed`] if the poll fails or exceeds the
    /// configured timeout. No partial property set is published.
    pub async fn refresh(&self) -> Result<(), Error> {
        let timeout = self.options.read().timeout();

        let outcome = match tokio::time::timeout(timeout, self.device.refresh()).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => return Err(self.fail(format!("Error updating: {e}"))),
            Err(_) => {
                return Err(self.fail(format!(
                    "Refresh timed out after {}s",
                    timeout.as_secs()
                )));
            }
        };

        self.device.derive_facts();
        self.available.store(true, Ordering::SeqCst);
        self.state_tx.send_replace(self.device.state());

        if let RefreshOutcome::Updated { properties } = outcome {
            self.device
                .events()
                .publish(WallboxEvent::refreshed(self.device.id(), properties));
        }
        Ok(())
    }

    fn fail(&self, message: String) -> Error {
        tracing::warn!(device = self.device.id(), error = %message, "Update failed");
        self.available.store(false, Ordering::SeqCst);
        self.device
            .events()
            .publish(WallboxEvent::update_failed(self.device.id(), &message));
        Error::UpdateFailed(message)
    }

    /// Applies changed options.
    ///
    /// Static categories are refetched on the next poll. A new timeout
    /// applies to the next request and poll; a new scan interval takes
    /// effect after the current wait.
    ///
    /// # Errors
    ///
    /// Returns error if an option is out of range; nothing is changed.
    pub fn apply_options(&self, options: EntryOptions) -> Result<(), Error> {
        options.validate()?;
        tracing::debug!(
            scan_interval = options.scan_interval,
            timeout = options.timeout,
            categories = ?options.refresh_categories,
            "Applying options"
        );

        self.device
            .set_dynamic_categories(options.refresh_categories.clone());
        self.device.set_request_timeout(options.timeout());
        *self.options.write() = options;
        self.device
            .events()
            .publish(WallboxEvent::options_updated(self.device.id()));
        Ok(())
    }

    /// Logs out of the wallbox.
    ///
    /// Stop the polling loop first; a logged-out device skips refreshes.
    ///
    /// # Errors
    ///
    /// Returns error if the logout request fails.
    pub async fn unload(&self) -> Result<(), Error> {
        tracing::debug!(device = self.device.id(), "Unloading");
        self.device.logout().await
    }

    /// Starts the polling loop.
    ///
    /// The first poll runs immediately. The loop runs until the returned
    /// handle is shut down or dropped.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> CoordinatorHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let coordinator = Arc::clone(self);

        let task = tokio::spawn(async move {
            let device_id = coordinator.device.id().to_string();
            tracing::debug!(%device_id, "Starting polling loop");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    // Failures are published on the event bus.
                    _ = coordinator.refresh() => {}
                }
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    () = tokio::time::sleep(coordinator.update_interval()) => {}
                }
            }

            tracing::debug!(%device_id, "Polling loop stopped");
        });

        CoordinatorHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running polling loop.
#[derive(Debug)]
pub struct CoordinatorHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CoordinatorHandle {
    /// Stops the loop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Polling loop panicked");
        }
    }

    /// Returns true once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

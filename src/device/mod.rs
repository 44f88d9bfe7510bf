// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for one Alfen wallbox.
//!
//! The [`Device`] owns the HTTPS session with the wallbox. It logs in on
//! demand, fetches properties category by category, reads and writes single
//! values, and follows the transaction log.
//!
//! # Sessions
//!
//! The wallbox hands out a session cookie at `/api/login` and answers 401
//! once it expires. Every authenticated request is retried once after a
//! fresh login. An explicit [`Device::logout`] turns this off until the next
//! explicit [`Device::login`], so a user can free the single API session for
//! the vendor app without the poller grabbing it back.
//!
//! ```no_run
//! use alfen_lib::Device;
//! use alfen_lib::types::Category;
//!
//! # async fn example() -> alfen_lib::Result<()> {
//! let device = Device::http("192.168.1.50")
//!     .with_credentials("admin", "secret")
//!     .with_name("garage")
//!     .with_refresh_categories([Category::Generic, Category::Meter1])
//!     .build()
//!     .await?;
//!
//! device.refresh().await?;
//! device.set_current_limit(16).await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod info;

pub use builder::DeviceBuilder;
pub use info::{DeviceInfo, GENERIC_MODEL, product_name};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{DeviceError, Error, ParseError, ProtocolError};
use crate::event::{EventBus, WallboxEvent};
use crate::protocol::{ApiRequest, ApiResponse, HttpClient, HttpConfig};
use crate::state::DeviceState;
use crate::transaction::parse_page;
use crate::types::{Category, ComfortPower, CurrentLimit, GreenShare, LicenseSet, Phase, Property, PropertyPage};

/// Property ids written by the typed setters.
pub mod ids {
    /// Maximum charging current in amperes.
    pub const CURRENT_LIMIT: &str = "2129_0";
    /// RFID authorization mode.
    pub const RFID_AUTH_MODE: &str = "2126_0";
    /// Phase used for single-phase charging.
    pub const CURRENT_PHASE: &str = "2069_0";
    /// Automatic 1/3 phase switching.
    pub const PHASE_SWITCHING: &str = "2185_0";
    /// Solar green share in percent.
    pub const GREEN_SHARE: &str = "3280_2";
    /// Solar comfort charging power in watts.
    pub const COMFORT_POWER: &str = "3280_3";
}

/// Consecutive failed page requests after which a refresh is abandoned.
const MAX_PAGE_ATTEMPTS: u32 = 3;

/// Upper bound on transaction log pages read in one pass.
const MAX_TRANSACTION_PAGES: usize = 256;

/// Outcome of [`Device::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new property snapshot was committed.
    Updated {
        /// Number of properties in the snapshot.
        properties: usize,
    },
    /// The device is logged out; nothing was requested.
    Skipped,
}

#[derive(Debug)]
struct RefreshPlan {
    dynamic: Vec<Category>,
    static_dirty: bool,
}

/// An Alfen wallbox reachable over its local HTTPS API.
///
/// All methods take `&self`; share the device behind an `Arc` between the
/// polling loop and whatever issues commands.
#[derive(Debug)]
pub struct Device {
    client: HttpClient,
    host: String,
    id: String,
    configured_name: Option<String>,
    username: String,
    password: String,
    display_name: String,
    info: RwLock<Option<DeviceInfo>>,
    keep_logout: AtomicBool,
    plan: Mutex<RefreshPlan>,
    static_cache: tokio::sync::Mutex<Option<Vec<Property>>>,
    state: Arc<RwLock<DeviceState>>,
    events: EventBus,
}

impl Device {
    /// Creates a builder for the wallbox at `host`.
    #[must_use]
    pub fn http(host: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::new(HttpConfig::new(host))
    }

    /// Creates a builder from a full HTTP configuration.
    #[must_use]
    pub fn http_config(config: HttpConfig) -> DeviceBuilder {
        DeviceBuilder::new(config)
    }

    pub(crate) fn new(
        config: HttpConfig,
        name: Option<String>,
        categories: Vec<Category>,
    ) -> Result<Self, ProtocolError> {
        let host = config.host().to_string();
        let username = config.username().to_string();
        let password = config.password().to_string();
        let display_name = config.display_name().to_string();
        let id = format!("alfen_{}", name.as_deref().unwrap_or(&host));
        let client = config.into_client()?;

        Ok(Self {
            client,
            host,
            id,
            configured_name: name,
            username,
            password,
            display_name,
            info: RwLock::new(None),
            keep_logout: AtomicBool::new(false),
            plan: Mutex::new(RefreshPlan {
                dynamic: categories,
                static_dirty: true,
            }),
            static_cache: tokio::sync::Mutex::new(None),
            state: Arc::new(RwLock::new(DeviceState::new())),
            events: EventBus::new(),
        })
    }

    // ========== Identity ==========

    /// Returns the device id, `alfen_<name>`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the configured name, or `"<identity> (<host>)"`.
    #[must_use]
    pub fn name(&self) -> String {
        match &self.configured_name {
            Some(name) => name.clone(),
            None => format!("{} ({})", self.info().identity, self.host),
        }
    }

    /// Returns the host the device was configured with.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the identity fetched by [`connect`](Self::connect).
    ///
    /// Before a successful connect this is the generic placeholder.
    #[must_use]
    pub fn info(&self) -> DeviceInfo {
        self.info
            .read()
            .clone()
            .unwrap_or_else(|| DeviceInfo::generic(&self.host))
    }

    /// Returns the timeout applied to each request.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.client.timeout()
    }

    /// Changes the timeout applied to each request.
    pub fn set_request_timeout(&self, timeout: Duration) {
        self.client.set_timeout(timeout);
    }

    /// Returns the event bus this device publishes to.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // ========== State ==========

    /// Returns a snapshot of the current device state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state.read().clone()
    }

    /// Runs `f` against the current state without cloning it.
    ///
    /// `f` must not block; the state lock is held while it runs.
    pub fn with_state<R>(&self, f: impl FnOnce(&DeviceState) -> R) -> R {
        f(&self.state.read())
    }

    /// Returns the number of sockets derived at the last refresh.
    #[must_use]
    pub fn number_of_sockets(&self) -> u8 {
        self.state.read().socket_count()
    }

    /// Returns the licenses derived at the last refresh.
    #[must_use]
    pub fn licenses(&self) -> LicenseSet {
        self.state.read().licenses()
    }

    /// Recomputes socket count and licenses from the current properties.
    pub fn derive_facts(&self) {
        self.state.write().derive_facts();
    }

    /// Returns true after an explicit logout.
    #[must_use]
    pub fn is_logged_out(&self) -> bool {
        self.keep_logout.load(Ordering::SeqCst)
    }

    // ========== Refresh plan ==========

    /// Returns the categories fetched on every refresh.
    #[must_use]
    pub fn dynamic_categories(&self) -> Vec<Category> {
        self.plan.lock().dynamic.clone()
    }

    /// Replaces the categories fetched on every refresh.
    ///
    /// Also marks static categories for refetching, since the static set is
    /// the complement of the dynamic one.
    pub fn set_dynamic_categories(&self, categories: Vec<Category>) {
        let mut plan = self.plan.lock();
        plan.dynamic = categories;
        plan.static_dirty = true;
    }

    /// Forces static categories to be refetched by the next refresh.
    pub fn mark_static_dirty(&self) {
        self.plan.lock().static_dirty = true;
    }

    /// Returns the categories fetched once and cached.
    #[must_use]
    pub fn static_categories(&self) -> Vec<Category> {
        static_categories(&self.plan.lock().dynamic)
    }

    // ========== Session ==========

    /// Fetches the device identity from `/api/info`.
    ///
    /// Returns `Ok(false)` and installs the generic placeholder when the
    /// endpoint answers with an error status.
    ///
    /// # Errors
    ///
    /// Returns error if the wallbox is unreachable or the identity cannot be
    /// decoded.
    pub async fn connect(&self) -> Result<bool, Error> {
        let response = self.client.execute(&ApiRequest::info()).await?;

        let (info, available) = if response.is_success() {
            let info = DeviceInfo::from_json(response.body()).map_err(ParseError::Json)?;
            (info, true)
        } else {
            tracing::debug!(
                status = response.status().as_u16(),
                "Info API not available, using generic info"
            );
            (DeviceInfo::generic(&self.host), false)
        };

        tracing::info!(
            device = %self.id,
            identity = %info.identity,
            model = %info.model,
            firmware = %info.firmware_version,
            "Connected to wallbox"
        );
        *self.info.write() = Some(info.clone());
        self.events.publish(WallboxEvent::connected(&self.id, info));
        Ok(available)
    }

    /// Logs in and re-enables automatic re-login.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the credentials are rejected.
    pub async fn login(&self) -> Result<(), Error> {
        self.keep_logout.store(false, Ordering::SeqCst);

        let request = ApiRequest::login(&self.username, &self.password, &self.display_name);
        let response = self.client.execute(&request).await?;
        Self::ensure_success(&request, response)?;

        tracing::debug!(device = %self.id, "Logged in");
        self.events.publish(WallboxEvent::logged_in(&self.id));
        Ok(())
    }

    /// Logs out and suppresses automatic re-login until [`login`](Self::login).
    ///
    /// Refreshes are skipped while logged out.
    ///
    /// # Errors
    ///
    /// Returns error if the logout request fails. Re-login stays suppressed
    /// either way.
    pub async fn logout(&self) -> Result<(), Error> {
        self.keep_logout.store(true, Ordering::SeqCst);

        let request = ApiRequest::logout();
        let response = self.client.execute(&request).await?;
        Self::ensure_success(&request, response)?;

        tracing::debug!(device = %self.id, "Logged out");
        self.events.publish(WallboxEvent::logged_out(&self.id));
        Ok(())
    }

    /// Sends an authenticated request, logging in once on 401.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ProtocolError> {
        let response = self.client.execute(request).await?;

        if response.is_unauthorized() && !self.is_logged_out() {
            tracing::debug!(path = request.path(), "Unauthorized, logging in");
            if let Err(e) = self.login().await {
                tracing::warn!(error = %e, "Login before retry failed");
            }
            let retry = self.client.execute(request).await?;
            return Self::ensure_success(request, retry);
        }

        Self::ensure_success(request, response)
    }

    fn ensure_success(
        request: &ApiRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse, ProtocolError> {
        if response.is_success() {
            Ok(response)
        } else if response.is_unauthorized() {
            Err(ProtocolError::AuthenticationFailed)
        } else {
            Err(ProtocolError::Status {
                status: response.status().as_u16(),
                path: request.path().to_string(),
            })
        }
    }

    /// Sends an authenticated GET and decodes the JSON body.
    ///
    /// `path` is relative to `/api/` and may carry a query string.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not JSON.
    pub async fn get(&self, path: &str) -> Result<Value, Error> {
        let request = ApiRequest::Get {
            path: path.to_string(),
        };
        let response = self.send(&request).await?;
        Ok(response.json()?)
    }

    /// Sends an authenticated POST and decodes the JSON body, if any.
    ///
    /// The firmware sometimes answers with a trailing comma in its JSON;
    /// such a body is treated as success without content.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is malformed.
    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Option<Value>, Error> {
        let request = ApiRequest::Post {
            path: path.to_string(),
            body,
        };
        let response = self.send(&request).await?;
        Self::optional_json(&request, &response)
    }

    /// Decodes a POST response body, tolerating an empty body and the
    /// trailing-comma quirk.
    fn optional_json(request: &ApiRequest, response: &ApiResponse) -> Result<Option<Value>, Error> {
        if response.body().trim().is_empty() {
            return Ok(None);
        }
        match response.json() {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_trailing_comma() => {
                tracing::debug!(path = request.path(), "Ignoring trailing comma in response");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ========== Properties ==========

    async fn fetch_page(&self, category: Category, offset: usize) -> Result<PropertyPage, Error> {
        let response = self
            .send(&ApiRequest::category_page(category, offset))
            .await?;
        Ok(response.json()?)
    }

    /// Fetches every property of one category, page by page.
    ///
    /// A failed page request is retried. After three consecutive failures
    /// the device's property list is cleared and the fetch is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::RefreshAborted`] after three consecutive
    /// failed page requests.
    pub async fn fetch_category_properties(
        &self,
        category: Category,
    ) -> Result<Vec<Property>, Error> {
        let started = Instant::now();
        let mut properties = Vec::new();
        let mut offset = 0;
        let mut attempts = 0;

        loop {
            match self.fetch_page(category, offset).await {
                Ok(page) => {
                    attempts = 0;
                    let len = page.properties.len();
                    properties.extend(page.properties);
                    if len == 0 || offset + len >= page.total {
                        break;
                    }
                    offset += len;
                }
                Err(e) => {
                    attempts += 1;
                    tracing::warn!(
                        category = %category,
                        offset,
                        attempt = attempts,
                        error = %e,
                        "Property page request failed"
                    );
                    if attempts >= MAX_PAGE_ATTEMPTS {
                        self.state.write().clear_properties();
                        return Err(DeviceError::RefreshAborted {
                            category: category.to_string(),
                            attempts,
                        }
                        .into());
                    }
                }
            }
        }

        tracing::info!(
            category = %category,
            count = properties.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Fetched category"
        );
        Ok(properties)
    }

    /// Fetches all properties and commits them as the new snapshot.
    ///
    /// Dynamic categories are fetched every time. Static categories are
    /// fetched on the first refresh and after an options change, then
    /// served from cache. Nothing is committed unless every category
    /// succeeds. When `transactions` is a dynamic category the transaction
    /// log is followed as well; a failure there is logged, not returned.
    ///
    /// Concurrent refreshes are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::RefreshAborted`] if a category could not be
    /// fetched.
    pub async fn refresh(&self) -> Result<RefreshOutcome, Error> {
        if self.is_logged_out() {
            tracing::debug!(device = %self.id, "Logged out, skipping refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        let mut static_cache = self.static_cache.lock().await;
        let dynamic = {
            let mut plan = self.plan.lock();
            if std::mem::take(&mut plan.static_dirty) {
                *static_cache = None;
            }
            plan.dynamic.clone()
        };

        if static_cache.is_none() {
            let mut fetched = Vec::new();
            for category in static_categories(&dynamic) {
                fetched.extend(self.fetch_category_properties(category).await?);
            }
            *static_cache = Some(fetched);
        }

        let mut dynamic_properties = Vec::new();
        for category in Category::ALL
            .into_iter()
            .filter(|c| c.is_property_category() && dynamic.contains(c))
        {
            dynamic_properties.extend(self.fetch_category_properties(category).await?);
        }

        let properties: Vec<Property> = static_cache
            .iter()
            .flatten()
            .cloned()
            .chain(dynamic_properties)
            .collect();
        let count = properties.len();
        self.state.write().replace_properties(properties);

        if dynamic.contains(&Category::Transactions) {
            if let Err(e) = self.update_transactions().await {
                tracing::warn!(device = %self.id, error = %e, "Transaction log update failed");
            }
        }

        Ok(RefreshOutcome::Updated { properties: count })
    }

    /// Reads transaction log pages from the last known offset.
    ///
    /// The cursor is committed after every page, so progress survives an
    /// error or a cancelled future.
    ///
    /// # Errors
    ///
    /// Returns error if a page request fails.
    pub async fn update_transactions(&self) -> Result<(), Error> {
        let mut cursor = self.state.read().transactions().clone();
        cursor.begin_pass();
        let mut offset = cursor.offset();

        for _ in 0..MAX_TRANSACTION_PAGES {
            let response = self.send(&ApiRequest::transactions(offset)).await?;

            let outcome = parse_page(response.body(), offset, &mut cursor);
            self.state.write().set_transactions(cursor.clone());
            tracing::debug!(
                offset,
                next_offset = outcome.next_offset,
                events = outcome.events.len(),
                status = ?outcome.status,
                "Parsed transaction page"
            );
            if !outcome.status.should_continue() {
                break;
            }
            offset = outcome.next_offset;
        }

        Ok(())
    }

    // ========== Values ==========

    /// Reads one property and patches it in the current snapshot.
    ///
    /// Returns the property as reported by the wallbox. Ids that are not in
    /// the snapshot are not added.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is malformed.
    pub async fn get_value(&self, id: &str) -> Result<Option<Property>, Error> {
        let response = self.send(&ApiRequest::property(id)).await?;
        let page: PropertyPage = response.json()?;

        {
            let mut state = self.state.write();
            for prop in &page.properties {
                state.patch(&prop.id, prop.value.clone());
            }
        }

        Ok(page.properties.into_iter().next())
    }

    /// Writes one property.
    ///
    /// On success the snapshot is patched with the written value without
    /// re-reading it; the next refresh corrects any drift.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_value(&self, id: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = value.into();
        tracing::debug!(id, value = %value, "Setting property");

        self.send(&ApiRequest::set_property(id, &value)).await?;
        self.state.write().patch(id, value);
        Ok(())
    }

    /// Sets the maximum charging current.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError`](crate::error::ValueError) without sending
    /// anything if `amps` is outside 1..=32.
    pub async fn set_current_limit(&self, amps: u8) -> Result<(), Error> {
        let limit = CurrentLimit::new(amps)?;
        tracing::debug!(limit = %limit, "Set current limit");
        self.set_value(ids::CURRENT_LIMIT, limit.amps()).await
    }

    /// Enables or disables RFID authorization.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_rfid_auth_mode(&self, enabled: bool) -> Result<(), Error> {
        tracing::debug!(enabled, "Set RFID auth mode");
        self.set_value(ids::RFID_AUTH_MODE, if enabled { 2 } else { 0 })
            .await
    }

    /// Selects the phase used for single-phase charging.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_current_phase(&self, phase: Phase) -> Result<(), Error> {
        tracing::debug!(phase = %phase, "Set current phase");
        self.set_value(ids::CURRENT_PHASE, phase.as_str()).await
    }

    /// Enables or disables automatic phase switching.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_phase_switching(&self, enabled: bool) -> Result<(), Error> {
        tracing::debug!(enabled, "Set phase switching");
        self.set_value(ids::PHASE_SWITCHING, u8::from(enabled)).await
    }

    /// Sets the solar green share.
    ///
    /// # Errors
    ///
    /// Returns a value error without sending anything if `percent` exceeds
    /// 100.
    pub async fn set_green_share(&self, percent: u8) -> Result<(), Error> {
        let share = GreenShare::new(percent)?;
        tracing::debug!(share = %share, "Set green share");
        self.set_value(ids::GREEN_SHARE, share.percent()).await
    }

    /// Sets the solar comfort charging power.
    ///
    /// # Errors
    ///
    /// Returns a value error without sending anything if `watts` is outside
    /// 1400..=5000.
    pub async fn set_comfort_power(&self, watts: u16) -> Result<(), Error> {
        let power = ComfortPower::new(watts)?;
        tracing::debug!(power = %power, "Set comfort power");
        self.set_value(ids::COMFORT_POWER, power.watts()).await
    }

    /// Reboots the wallbox.
    ///
    /// # Errors
    ///
    /// Returns error if the command is not accepted.
    pub async fn reboot(&self) -> Result<(), Error> {
        tracing::info!(device = %self.id, "Rebooting wallbox");
        let request = ApiRequest::command("reboot");
        let response = self.send(&request).await.map_err(|e| match e {
            ProtocolError::Status { status, .. } => {
                Error::from(DeviceError::CommandRejected(format!("reboot (HTTP {status})")))
            }
            other => other.into(),
        })?;
        Self::optional_json(&request, &response).map(|_| ())
    }
}

/// Property categories not in `dynamic`, in firmware order.
fn static_categories(dynamic: &[Category]) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| c.is_property_category() && !dynamic.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValueError;

    fn offline_device(name: Option<&str>) -> Device {
        let mut builder = Device::http("192.0.2.1").with_refresh_categories(Category::DEFAULT_REFRESH);
        if let Some(name) = name {
            builder = builder.with_name(name);
        }
        builder.build_without_probe().unwrap()
    }

    #[test]
    fn id_and_name_from_configured_name() {
        let device = offline_device(Some("garage"));
        assert_eq!(device.id(), "alfen_garage");
        assert_eq!(device.name(), "garage");
    }

    #[test]
    fn name_falls_back_to_identity_and_host() {
        let device = offline_device(None);
        assert_eq!(device.name(), "192.0.2.1 (192.0.2.1)");
        assert_eq!(device.id(), "alfen_192.0.2.1");
    }

    #[test]
    fn static_categories_are_complement_without_transactions() {
        let statics = static_categories(&Category::DEFAULT_REFRESH);
        assert!(!statics.contains(&Category::Generic));
        assert!(!statics.contains(&Category::Transactions));
        assert!(statics.contains(&Category::Display));
        assert_eq!(statics.len(), 8);
    }

    #[test]
    fn changing_dynamic_categories_marks_static_dirty() {
        let device = offline_device(Some("x"));
        device.plan.lock().static_dirty = false;

        device.set_dynamic_categories(vec![Category::Meter1]);

        assert!(device.plan.lock().static_dirty);
        assert_eq!(device.dynamic_categories(), vec![Category::Meter1]);
        assert!(device.static_categories().contains(&Category::Generic));
    }

    #[tokio::test]
    async fn out_of_range_setters_fail_before_any_request() {
        let device = offline_device(Some("x"));

        let err = device.set_current_limit(0).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Value(ValueError::OutOfRange { min: 1, max: 32, actual: 0 })
        ));
        assert!(device.set_current_limit(33).await.is_err());
        assert!(device.set_green_share(101).await.is_err());
        assert!(device.set_comfort_power(1399).await.is_err());
        assert!(device.set_comfort_power(5001).await.is_err());
    }

    #[tokio::test]
    async fn logged_out_refresh_is_skipped() {
        let device = offline_device(Some("x"));
        device.keep_logout.store(true, Ordering::SeqCst);

        let outcome = device.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Skipped);
    }
}

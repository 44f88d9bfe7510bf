// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device builder.

use std::time::Duration;

use crate::device::Device;
use crate::error::Error;
use crate::protocol::HttpConfig;
use crate::types::Category;

/// Builder for [`Device`].
///
/// Created with `Device::http("host")` for the common case or
/// `Device::http_config(HttpConfig::new("host").with_port(8443))` for full
/// control over the connection.
///
/// # Examples
///
/// ```no_run
/// use alfen_lib::Device;
///
/// # async fn example() -> alfen_lib::Result<()> {
/// // Fetches the identity from /api/info
/// let device = Device::http("192.168.1.50")
///     .with_credentials("admin", "secret")
///     .with_name("garage")
///     .build()
///     .await?;
///
/// // No network access until the first request
/// let device = Device::http("192.168.1.50")
///     .with_credentials("admin", "secret")
///     .build_without_probe()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceBuilder {
    config: HttpConfig,
    name: Option<String>,
    categories: Vec<Category>,
}

impl DeviceBuilder {
    pub(crate) fn new(config: HttpConfig) -> Self {
        Self {
            config,
            name: None,
            categories: Category::DEFAULT_REFRESH.to_vec(),
        }
    }

    /// Sets login credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config = self.config.with_credentials(username, password);
        self
    }

    /// Sets the display name announced at login.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.config = self.config.with_display_name(display_name);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_timeout(timeout);
        self
    }

    /// Sets the device name used for its id and entity names.
    ///
    /// Without a name the device is named after its identity and host.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the categories fetched on every refresh.
    ///
    /// Defaults to [`Category::DEFAULT_REFRESH`].
    #[must_use]
    pub fn with_refresh_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    /// Returns the configured dynamic categories.
    #[must_use]
    pub fn refresh_categories(&self) -> &[Category] {
        &self.categories
    }

    /// Builds the device and fetches its identity.
    ///
    /// A wallbox without `/api/info` still builds, with the generic
    /// placeholder identity.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the wallbox is unreachable.
    pub async fn build(self) -> Result<Device, Error> {
        let device = self.build_without_probe()?;
        device.connect().await?;
        Ok(device)
    }

    /// Builds the device without any network access.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be
    /// created.
    pub fn build_without_probe(self) -> Result<Device, Error> {
        Ok(Device::new(self.config, self.name, self.categories)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = DeviceBuilder::new(HttpConfig::new("192.168.1.50"));
        assert!(builder.name.is_none());
        assert_eq!(builder.refresh_categories(), Category::DEFAULT_REFRESH);
    }

    #[test]
    fn builder_keeps_connection_settings() {
        let builder = DeviceBuilder::new(HttpConfig::new("192.168.1.50").with_port(8443))
            .with_credentials("admin", "pw")
            .with_display_name("poller")
            .with_timeout(Duration::from_secs(3));

        assert_eq!(builder.config.base_url(), "https://192.168.1.50:8443");
        assert_eq!(builder.config.password(), "pw");
        assert_eq!(builder.config.display_name(), "poller");
        assert_eq!(builder.config.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn build_without_probe_uses_categories() {
        let device = DeviceBuilder::new(HttpConfig::new("192.168.1.50"))
            .with_refresh_categories([Category::States, Category::Transactions])
            .build_without_probe()
            .unwrap();

        assert_eq!(
            device.dynamic_categories(),
            vec![Category::States, Category::Transactions]
        );
        assert!(device.info().is_generic());
    }

    #[test]
    fn empty_host_fails() {
        assert!(DeviceBuilder::new(HttpConfig::new("")).build_without_probe().is_err());
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Persisted wallbox configuration.
//!
//! A [`ConfigEntry`] holds what the user entered once ([`EntryData`]:
//! host and credentials) and what can be tuned later ([`EntryOptions`]:
//! polling interval, per-poll timeout and the categories fetched on every
//! poll). Entries are stored as JSON and carry a schema version; older
//! versions are migrated on load.
//!
//! # Examples
//!
//! ```
//! use alfen_lib::config::{ConfigEntry, EntryData};
//!
//! let entry = ConfigEntry::new(EntryData::new("192.168.1.50", "garage", "secret"));
//! assert_eq!(entry.data.username, "admin");
//! assert_eq!(entry.options.scan_interval, 5);
//! assert!(entry.validate().is_ok());
//! ```

mod migration;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::{Device, DeviceBuilder};
use crate::error::ConfigError;
use crate::protocol::HttpConfig;
use crate::types::Category;

/// Current schema version of persisted entries.
pub const CONFIG_VERSION: u32 = 2;

/// Default polling interval in seconds.
pub const DEFAULT_SCAN_INTERVAL: u64 = 5;

/// Default per-poll timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 20;

/// Connection data entered when the wallbox was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    /// Hostname or IP address.
    pub host: String,
    /// Device name, used for the device id and entity names.
    pub name: String,
    /// Login user.
    #[serde(default = "default_username")]
    pub username: String,
    /// Login password.
    pub password: String,
}

fn default_username() -> String {
    HttpConfig::DEFAULT_USERNAME.to_string()
}

impl EntryData {
    /// Creates connection data with the default `admin` user.
    #[must_use]
    pub fn new(host: impl Into<String>, name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            username: default_username(),
            password: password.into(),
        }
    }

    /// Sets the login user.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}

/// Tunable polling options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryOptions {
    /// Seconds between polls, 1..=300.
    pub scan_interval: u64,
    /// Seconds a single poll may take, 1..=30.
    pub timeout: u64,
    /// Categories fetched on every poll; the rest are fetched once.
    pub refresh_categories: Vec<Category>,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            refresh_categories: Category::DEFAULT_REFRESH.to_vec(),
        }
    }
}

impl EntryOptions {
    /// Checks that every option is within its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OptionOutOfRange`] for the first offending
    /// option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("scan_interval", self.scan_interval, 1, 300)?;
        check_range("timeout", self.timeout, 1, 30)
    }

    /// Returns the polling interval.
    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    /// Returns the per-poll timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn check_range(name: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OptionOutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// A persisted wallbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Unique entry id.
    pub entry_id: Uuid,
    /// Schema version.
    pub version: u32,
    /// Display title, the host by default.
    pub title: String,
    /// Connection data.
    pub data: EntryData,
    /// Polling options.
    #[serde(default)]
    pub options: EntryOptions,
}

impl ConfigEntry {
    /// Creates a new entry with default options.
    #[must_use]
    pub fn new(data: EntryData) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            version: CONFIG_VERSION,
            title: data.host.clone(),
            data,
            options: EntryOptions::default(),
        }
    }

    /// Creates a new entry unless one for the same host already exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AlreadyConfigured`] if `existing` contains an
    /// entry for the same host.
    pub fn create(existing: &[Self], data: EntryData) -> Result<Self, ConfigError> {
        if existing.iter().any(|e| e.data.host == data.host) {
            return Err(ConfigError::AlreadyConfigured(data.host));
        }
        Ok(Self::new(data))
    }

    /// Replaces the options after validating them.
    ///
    /// # Errors
    ///
    /// Returns error if an option is out of range; the entry is unchanged.
    pub fn set_options(&mut self, options: EntryOptions) -> Result<(), ConfigError> {
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Checks the schema version and options.
    ///
    /// # Errors
    ///
    /// Returns error if the version is unknown or an option is out of
    /// range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        self.options.validate()
    }

    /// Returns the HTTP configuration for this entry.
    ///
    /// The per-request timeout starts at the per-poll timeout.
    #[must_use]
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::new(&self.data.host)
            .with_credentials(&self.data.username, &self.data.password)
            .with_timeout(self.options.timeout())
    }

    /// Returns a device builder for this entry.
    #[must_use]
    pub fn device_builder(&self) -> DeviceBuilder {
        let mut builder = Device::http_config(self.http_config())
            .with_refresh_categories(self.options.refresh_categories.iter().copied());
        if !self.data.name.is_empty() {
            builder = builder.with_name(&self.data.name);
        }
        builder
    }

    /// Decodes an entry from JSON, migrating older versions.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed, the version is unknown, or
    /// an option is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        let migrated = migration::migrate(raw)?;
        let entry: Self = serde_json::from_value(migrated)?;
        entry.validate()?;
        Ok(entry)
    }

    /// Encodes the entry as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads an entry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or decoded.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading config entry");
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Saves the entry to a JSON file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), entry_id = %self.entry_id, "Saved config entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ConfigEntry {
        ConfigEntry::new(EntryData::new("192.168.1.50", "garage", "secret"))
    }

    #[test]
    fn default_options() {
        let options = EntryOptions::default();
        assert_eq!(options.scan_interval(), Duration::from_secs(5));
        assert_eq!(options.timeout(), Duration::from_secs(20));
        assert_eq!(
            options.refresh_categories,
            vec![
                Category::Generic,
                Category::Generic2,
                Category::Meter1,
                Category::States,
                Category::Temp
            ]
        );
    }

    #[test]
    fn option_bounds() {
        let mut options = EntryOptions::default();
        options.scan_interval = 0;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::OptionOutOfRange { name: "scan_interval", .. })
        ));

        options.scan_interval = 300;
        options.timeout = 31;
        assert!(matches!(
            options.validate(),
            Err(ConfigError::OptionOutOfRange { name: "timeout", .. })
        ));

        options.timeout = 30;
        assert!(options.validate().is_ok());
    }

    #[test]
    fn set_options_rejects_invalid_and_keeps_old() {
        let mut entry = entry();
        let bad = EntryOptions {
            scan_interval: 301,
            ..EntryOptions::default()
        };
        assert!(entry.set_options(bad).is_err());
        assert_eq!(entry.options.scan_interval, 5);
    }

    #[test]
    fn create_refuses_duplicate_host() {
        let existing = vec![entry()];
        let err = ConfigEntry::create(
            &existing,
            EntryData::new("192.168.1.50", "other", "pw"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyConfigured(host) if host == "192.168.1.50"));

        assert!(ConfigEntry::create(&existing, EntryData::new("192.168.1.51", "b", "pw")).is_ok());
    }

    #[test]
    fn json_uses_category_names() {
        let json = entry().to_json().unwrap();
        assert!(json.contains("\"generic2\""));
        assert!(json.contains("\"refresh_categories\""));
    }

    #[test]
    fn save_and_load_in_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries").join("garage.json");

        let mut original = entry();
        original.options.refresh_categories = vec![Category::MbusTcp, Category::Transactions];
        original.save(&path).unwrap();

        let loaded = ConfigEntry::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigEntry::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let mut value = serde_json::to_value(entry()).unwrap();
        value["options"]["refresh_categories"] = serde_json::json!(["generic", "bogus"]);
        let err = ConfigEntry::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn device_builder_from_entry() {
        let device = entry().device_builder().build_without_probe().unwrap();
        assert_eq!(device.id(), "alfen_garage");
        assert_eq!(device.dynamic_categories(), Category::DEFAULT_REFRESH.to_vec());
    }
}

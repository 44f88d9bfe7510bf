// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema migration of persisted entries.
//!
//! Version 1 kept the scan interval next to the credentials and had no
//! options. Version 2 moved it into the options, together with the poll
//! timeout and the refresh categories.

use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::{CONFIG_VERSION, DEFAULT_SCAN_INTERVAL, EntryOptions};
use crate::error::ConfigError;

/// Upgrades a raw entry to the current version.
pub(super) fn migrate(raw: Value) -> Result<Value, ConfigError> {
    let version = raw
        .get("version")
        .and_then(Value::as_u64)
        .map_or(Ok(1), u32::try_from)
        .map_err(|_| ConfigError::UnsupportedVersion(u32::MAX))?;

    match version {
        1 => {
            tracing::debug!("Migrating config entry from version 1");
            let migrated = migrate_v1(&raw)?;
            tracing::debug!(version = CONFIG_VERSION, "Migration successful");
            Ok(migrated)
        }
        CONFIG_VERSION => Ok(raw),
        other => Err(ConfigError::UnsupportedVersion(other)),
    }
}

fn migrate_v1(raw: &Value) -> Result<Value, ConfigError> {
    let empty = Map::new();
    let data = raw.get("data").and_then(Value::as_object).unwrap_or(&empty);
    let field = |key: &str| data.get(key).cloned().unwrap_or(Value::Null);

    let defaults = EntryOptions::default();
    let options = EntryOptions {
        scan_interval: data
            .get("scan_interval")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_SCAN_INTERVAL),
        ..defaults
    };

    let host = field("host");
    let entry_id = raw
        .get("entry_id")
        .cloned()
        .unwrap_or_else(|| json!(Uuid::new_v4()));
    let title = raw.get("title").cloned().unwrap_or_else(|| host.clone());

    Ok(json!({
        "entry_id": entry_id,
        "version": CONFIG_VERSION,
        "title": title,
        "data": {
            "host": host,
            "name": field("name"),
            "username": field("username"),
            "password": field("password"),
        },
        "options": serde_json::to_value(options)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigEntry;

    #[test]
    fn version_one_moves_scan_interval_into_options() {
        let v1 = json!({
            "version": 1,
            "data": {
                "host": "192.168.1.50",
                "name": "garage",
                "username": "admin",
                "password": "secret",
                "scan_interval": 30
            }
        });

        let entry = ConfigEntry::from_json(&v1.to_string()).unwrap();

        assert_eq!(entry.version, 2);
        assert_eq!(entry.title, "192.168.1.50");
        assert_eq!(entry.data.name, "garage");
        assert_eq!(entry.options.scan_interval, 30);
        assert_eq!(entry.options.timeout, 20);
        assert_eq!(entry.options, EntryOptions { scan_interval: 30, ..EntryOptions::default() });
    }

    #[test]
    fn version_one_without_scan_interval_uses_default() {
        let v1 = json!({
            "entry_id": "6f1c1f38-3f0e-4c5b-9b0c-1f4f1b8f2a10",
            "version": 1,
            "data": {"host": "wallbox.local", "name": "w", "username": "admin", "password": "pw"}
        });

        let migrated = migrate(v1).unwrap();
        assert_eq!(migrated["options"]["scan_interval"], json!(5));
        assert_eq!(migrated["entry_id"], json!("6f1c1f38-3f0e-4c5b-9b0c-1f4f1b8f2a10"));
    }

    #[test]
    fn current_version_is_untouched() {
        let v2 = json!({"version": 2, "data": {}});
        assert_eq!(migrate(v2.clone()).unwrap(), v2);
    }

    #[test]
    fn future_version_is_rejected() {
        let err = migrate(json!({"version": 3})).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion(3)));
    }
}

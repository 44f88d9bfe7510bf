// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static device identity from `/api/info`.

use serde::{Deserialize, Serialize};

/// Model name shown when `/api/info` is unavailable.
pub const GENERIC_MODEL: &str = "Generic Alfen Wallbox";

const UNKNOWN: &str = "?";

/// Known product numbers and their marketing names.
const PRODUCT_MAP: &[(&str, &str)] = &[
    ("NG900-60503", "Eve Double Pro-line"),
    ("NG900-60505", "Eve Double Pro-line"),
    ("NG910-60023", "Eve Single Pro-line"),
    ("NG910-60123", "Eve Single Pro-line"),
    ("NG910-60503", "Eve Single Pro-line"),
    ("NG910-60553", "Eve Single Pro-line"),
    ("NG910-60583", "Eve Single Pro-line"),
    ("NG920-61001", "Eve Double PG"),
    ("NG920-61002", "Eve Double PG"),
    ("NG920-61011", "Eve Double PG"),
    ("NG920-61012", "Eve Double PG"),
];

/// Returns the product name for a model id, or the id itself if unknown.
#[must_use]
pub fn product_name(model_id: &str) -> &str {
    PRODUCT_MAP
        .iter()
        .find(|(id, _)| *id == model_id)
        .map_or(model_id, |(_, name)| name)
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(rename = "Identity")]
    identity: String,
    #[serde(rename = "FWVersion", default = "unknown")]
    firmware_version: String,
    #[serde(rename = "Model", default = "unknown")]
    model: String,
    #[serde(rename = "ObjectId", default = "unknown")]
    object_id: String,
    #[serde(rename = "Type", default = "unknown")]
    device_type: String,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// Identity of a wallbox.
///
/// # Examples
///
/// ```
/// use alfen_lib::device::DeviceInfo;
///
/// let info = DeviceInfo::from_json(
///     r#"{"Identity":"ACE0123456","FWVersion":"6.4.0-4210","Model":"NG910-60023","ObjectId":"1","Type":"2"}"#,
/// )
/// .unwrap();
///
/// assert_eq!(info.model, "Eve Single Pro-line");
/// assert_eq!(info.model_id, "NG910-60023");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Serial-like identity string.
    pub identity: String,
    /// Firmware version.
    pub firmware_version: String,
    /// Raw model id.
    pub model_id: String,
    /// Model name resolved through the product map.
    pub model: String,
    /// Object id.
    pub object_id: String,
    /// Device type.
    #[serde(rename = "type")]
    pub device_type: String,
}

impl DeviceInfo {
    /// Decodes the body of `/api/info`.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not JSON or lacks `Identity`.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: InfoResponse = serde_json::from_str(body)?;
        Ok(Self {
            model: product_name(&raw.model).to_string(),
            identity: raw.identity,
            firmware_version: raw.firmware_version,
            model_id: raw.model,
            object_id: raw.object_id,
            device_type: raw.device_type,
        })
    }

    /// Placeholder identity for wallboxes without `/api/info`.
    #[must_use]
    pub fn generic(host: &str) -> Self {
        Self {
            identity: host.to_string(),
            firmware_version: unknown(),
            model_id: GENERIC_MODEL.to_string(),
            model: GENERIC_MODEL.to_string(),
            object_id: unknown(),
            device_type: unknown(),
        }
    }

    /// Returns true if this is the placeholder identity.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.model_id == GENERIC_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_model_falls_back_to_id() {
        assert_eq!(product_name("NG999-00000"), "NG999-00000");
        assert_eq!(product_name("NG920-61011"), "Eve Double PG");
    }

    #[test]
    fn generic_placeholder() {
        let info = DeviceInfo::generic("192.168.1.50");
        assert_eq!(info.identity, "192.168.1.50");
        assert_eq!(info.model, "Generic Alfen Wallbox");
        assert_eq!(info.firmware_version, "?");
        assert_eq!(info.object_id, "?");
        assert_eq!(info.device_type, "?");
        assert!(info.is_generic());
    }

    #[test]
    fn missing_optional_fields() {
        let info = DeviceInfo::from_json(r#"{"Identity":"ACE1"}"#).unwrap();
        assert_eq!(info.firmware_version, "?");
        assert_eq!(info.model, "?");
        assert!(!info.is_generic());
    }

    #[test]
    fn missing_identity_is_an_error() {
        assert!(DeviceInfo::from_json(r#"{"Model":"NG910-60023"}"#).is_err());
    }
}

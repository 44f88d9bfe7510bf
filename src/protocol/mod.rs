// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire protocol of the Alfen local HTTPS API.
//!
//! This module knows how to build each request the wallbox understands and
//! how to send it. It has no notion of sessions or retries; the
//! [`Device`](crate::Device) layers the re-login protocol on top.
//!
//! | Endpoint | Method | Purpose |
//! |---|---|---|
//! | `/api/info` | GET | static device identity |
//! | `/api/login` | POST | establish session |
//! | `/api/logout` | POST | terminate session |
//! | `/api/prop?cat=C&offset=O` | GET | paged property fetch |
//! | `/api/prop?id=ID` | GET | single property fetch |
//! | `/api/prop` | POST | single property set |
//! | `/api/cmd` | POST | device command |
//! | `/api/transactions?offset=O` | GET | transaction log page (text) |

mod http;

pub use http::{HttpClient, HttpConfig};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::ParseError;
use crate::types::Category;

/// A request to the wallbox API, relative to `/api/`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    /// HTTP GET of a path with query string.
    Get {
        /// Path relative to `/api/`, including the query string.
        path: String,
    },
    /// HTTP POST with an optional JSON body.
    Post {
        /// Path relative to `/api/`.
        path: String,
        /// JSON body.
        body: Option<Value>,
    },
}

impl ApiRequest {
    /// `GET /api/info`.
    #[must_use]
    pub fn info() -> Self {
        Self::Get {
            path: "info".to_string(),
        }
    }

    /// `POST /api/login`.
    #[must_use]
    pub fn login(username: &str, password: &str, display_name: &str) -> Self {
        Self::Post {
            path: "login".to_string(),
            body: Some(json!({
                "username": username,
                "password": password,
                "displayName": display_name,
            })),
        }
    }

    /// `POST /api/logout`.
    #[must_use]
    pub fn logout() -> Self {
        Self::Post {
            path: "logout".to_string(),
            body: None,
        }
    }

    /// `GET /api/prop?cat=C&offset=O`.
    #[must_use]
    pub fn category_page(category: Category, offset: usize) -> Self {
        Self::Get {
            path: format!(
                "prop?cat={}&offset={offset}",
                urlencoding::encode(category.as_str())
            ),
        }
    }

    /// `GET /api/prop?id=ID`.
    #[must_use]
    pub fn property(id: &str) -> Self {
        Self::Get {
            path: format!("prop?id={}", urlencoding::encode(id)),
        }
    }

    /// `POST /api/prop` with `{id: {id, value}}`.
    ///
    /// The device expects the value in its textual form.
    #[must_use]
    pub fn set_property(id: &str, value: &Value) -> Self {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self::Post {
            path: "prop".to_string(),
            body: Some(json!({ id: { "id": id, "value": text } })),
        }
    }

    /// `POST /api/cmd` with `{"command": ...}`.
    #[must_use]
    pub fn command(command: &str) -> Self {
        Self::Post {
            path: "cmd".to_string(),
            body: Some(json!({ "command": command })),
        }
    }

    /// `GET /api/transactions?offset=O`.
    #[must_use]
    pub fn transactions(offset: u64) -> Self {
        Self::Get {
            path: format!("transactions?offset={offset}"),
        }
    }

    /// Returns the path relative to `/api/`.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Get { path } | Self::Post { path, .. } => path,
        }
    }
}

/// Raw response from the wallbox.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    /// Creates a response from a status and body.
    #[must_use]
    pub fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns true for 401 responses.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    /// Returns true for 2xx responses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ParseError> {
        serde_json::from_str(&self.body).map_err(ParseError::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_page_path() {
        let req = ApiRequest::category_page(Category::MbusTcp, 32);
        assert_eq!(req.path(), "prop?cat=MbusTCP&offset=32");
    }

    #[test]
    fn set_property_sends_value_as_text() {
        let req = ApiRequest::set_property("2129_0", &json!(16));
        let ApiRequest::Post { body: Some(body), .. } = req else {
            panic!("expected POST with body");
        };
        assert_eq!(body, json!({"2129_0": {"id": "2129_0", "value": "16"}}));
    }

    #[test]
    fn set_property_keeps_strings_verbatim() {
        let req = ApiRequest::set_property("2069_0", &json!("L2"));
        let ApiRequest::Post { body: Some(body), .. } = req else {
            panic!("expected POST with body");
        };
        assert_eq!(body["2069_0"]["value"], json!("L2"));
    }

    #[test]
    fn login_body_fields() {
        let req = ApiRequest::login("admin", "secret", "ha");
        let ApiRequest::Post { path, body: Some(body) } = req else {
            panic!("expected POST with body");
        };
        assert_eq!(path, "login");
        assert_eq!(
            body,
            json!({"username": "admin", "password": "secret", "displayName": "ha"})
        );
    }

    #[test]
    fn command_body() {
        let req = ApiRequest::command("reboot");
        let ApiRequest::Post { path, body: Some(body) } = req else {
            panic!("expected POST with body");
        };
        assert_eq!(path, "cmd");
        assert_eq!(body, json!({"command": "reboot"}));
    }

    #[test]
    fn property_id_is_encoded() {
        assert_eq!(ApiRequest::property("2129_0").path(), "prop?id=2129_0");
        assert_eq!(ApiRequest::property("a b").path(), "prop?id=a%20b");
    }

    #[test]
    fn response_status_helpers() {
        let resp = ApiResponse::new(StatusCode::UNAUTHORIZED, String::new());
        assert!(resp.is_unauthorized());
        assert!(!resp.is_success());
    }
}

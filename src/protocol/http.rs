// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTPS transport for the wallbox API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use reqwest::Client;

use crate::error::ProtocolError;
use crate::protocol::{ApiRequest, ApiResponse};

// ============================================================================
// HttpConfig - Connection parameters for one wallbox
// ============================================================================

/// Configuration for the HTTPS connection to a wallbox.
///
/// The wallbox serves a self-signed certificate, so certificate verification
/// is disabled unless [`with_certificate_verification`] is called.
///
/// [`with_certificate_verification`]: HttpConfig::with_certificate_verification
///
/// # Examples
///
/// ```
/// use alfen_lib::protocol::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.50")
///     .with_credentials("admin", "secret")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://192.168.1.50");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: Option<u16>,
    use_https: bool,
    username: String,
    password: String,
    display_name: String,
    timeout: Duration,
    verify_certificates: bool,
}

impl HttpConfig {
    /// Username used when none is configured.
    pub const DEFAULT_USERNAME: &'static str = "admin";
    /// Display name announced to the wallbox at login.
    pub const DEFAULT_DISPLAY_NAME: &'static str = "ha";
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the specified host.
    ///
    /// # Arguments
    ///
    /// * `host` - Hostname or IP address, optionally with `:port`
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            use_https: true,
            username: Self::DEFAULT_USERNAME.to_string(),
            password: String::new(),
            display_name: Self::DEFAULT_DISPLAY_NAME.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            verify_certificates: false,
        }
    }

    /// Sets an explicit port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Uses plain HTTP instead of HTTPS.
    #[must_use]
    pub fn without_https(mut self) -> Self {
        self.use_https = false;
        self
    }

    /// Sets login credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the display name sent with the login request.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables TLS certificate verification.
    #[must_use]
    pub fn with_certificate_verification(mut self) -> Self {
        self.verify_certificates = true;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the login username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the login display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether HTTPS is used.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{}:{port}", self.host),
            None => format!("{scheme}://{}", self.host),
        }
    }

    /// Creates an `HttpClient` from this configuration.
    ///
    /// The client keeps the session cookie issued by the login endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be created.
    pub fn into_client(self) -> Result<HttpClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress("host is required".to_string()));
        }

        let base_url = self.base_url();

        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!self.verify_certificates)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpClient {
            base_url,
            client,
            timeout: Arc::new(RwLock::new(self.timeout)),
        })
    }
}

// ============================================================================
// HttpClient - Sends requests, knows nothing about sessions
// ============================================================================

/// HTTP client bound to one wallbox.
///
/// The request timeout can be changed while the client is in use; clones
/// share it.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
    timeout: Arc<RwLock<Duration>>,
}

impl HttpClient {
    /// Returns the timeout applied to each request.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        *self.timeout.read()
    }

    /// Changes the timeout for requests sent from now on.
    pub fn set_timeout(&self, timeout: Duration) {
        *self.timeout.write() = timeout;
    }

    /// Returns the base URL of the device.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the full URL for an API path.
    fn build_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    /// Sends a request and returns the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns error on connection failure, timeout, or if the body cannot be read.
    pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, ProtocolError> {
        let url = self.build_url(request.path());

        let builder = match request {
            ApiRequest::Get { .. } => {
                tracing::debug!(url = %url, "Sending GET request");
                self.client.get(&url)
            }
            ApiRequest::Post { body, .. } => {
                tracing::debug!(url = %url, "Sending POST request");
                let builder = self.client.post(&url);
                match body {
                    Some(body) => builder.json(body),
                    None => builder.header(reqwest::header::CONTENT_TYPE, "application/json"),
                }
            }
        };

        let timeout = self.timeout();
        let response = builder
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_error(e, timeout))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| map_error(e, timeout))?;

        tracing::debug!(status = status.as_u16(), len = body.len(), "Received response");

        Ok(ApiResponse::new(status, body))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn map_error(err: reqwest::Error, timeout: Duration) -> ProtocolError {
    if err.is_timeout() {
        ProtocolError::Timeout(timeout.as_millis() as u64)
    } else {
        ProtocolError::Http(err)
    }
}

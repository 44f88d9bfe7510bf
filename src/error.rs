// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `alfen_lib` library.
//!
//! The hierarchy separates value validation (typed setters), protocol
//! communication with the wallbox, response decoding, device-level failures
//! and persisted configuration problems. Only the coordinator produces
//! [`Error::UpdateFailed`], the structured signal a host uses to mark the
//! wallbox unavailable.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during communication with the wallbox.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while decoding a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during a device operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Persisted configuration is invalid or could not be accessed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A setup or refresh cycle failed; dependent entities become unavailable.
    #[error("update failed: {0}")]
    UpdateFailed(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// A phase name other than `L1`, `L2` or `L3` was provided.
    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    /// An unknown property category name was provided.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Errors related to HTTP communication with the wallbox.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The wallbox answered with a non-success status.
    #[error("HTTP {status} on {path}")]
    Status {
        /// Numeric HTTP status code.
        status: u16,
        /// Request path that failed.
        path: String,
    },

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Authentication failed, or re-login is suppressed after a logout.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to decoding wallbox responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON decoding failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    /// Returns true for the wallbox's known trailing-comma JSON quirk.
    ///
    /// The firmware sometimes emits `{"a":1,}` on otherwise successful
    /// responses.
    #[must_use]
    pub fn is_trailing_comma(&self) -> bool {
        matches!(self, Self::Json(e) if e.to_string().starts_with("trailing comma"))
    }
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A paged category fetch failed three times in a row; the whole
    /// refresh was abandoned.
    #[error("refresh aborted after {attempts} failed attempts on category {category}")]
    RefreshAborted {
        /// Category that could not be fetched.
        category: String,
        /// Number of consecutive failed attempts.
        attempts: u32,
    },

    /// Command was rejected by the device.
    #[error("command rejected: {0}")]
    CommandRejected(String),
}

/// Errors related to persisted configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for the expected schema.
    #[error("invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),

    /// An option value is outside its allowed range.
    #[error("option {name} = {value} is out of range [{min}, {max}]")]
    OptionOutOfRange {
        /// Option name.
        name: &'static str,
        /// Provided value.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },

    /// A config entry for this host already exists.
    #[error("host {0} is already configured")]
    AlreadyConfigured(String),

    /// The entry was written by an unknown schema version.
    #[error("unsupported config entry version {0}")]
    UnsupportedVersion(u32),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

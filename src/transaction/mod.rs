// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Charging transaction log.
//!
//! The wallbox has no structured transaction API. Its only record of
//! charging sessions is an append-only text log served page by page from
//! `/api/transactions?offset=O`. Each line starts with a numeric id:
//!
//! ```text
//! 23_txstart2: id 0x0000000000000017, socket 1, 2024-03-01 18:02:11 1523.120kWh 04A2B3C4D5 3 1 y
//! 24_mv: socket 1, 2024-03-01 18:17:11 1525.404
//! 25_txstop2: id 0x0000000000000017, socket 1, 2024-03-01 21:40:02 1541.877kWh 04A2B3C4D5 2 y
//! 0_Empty
//! ```
//!
//! [`parse_page`] is a pure function over one page of text and a
//! [`TransactionCursor`]; the network loop lives in the device client.

mod log_parser;

pub use log_parser::{PageOutcome, PageStatus, parse_page};

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

/// An energy meter reading at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Date and time as written in the log.
    pub date: String,
    /// Local wallbox time, if `date` is in a known format.
    pub timestamp: Option<NaiveDateTime>,
    /// Meter value in kWh.
    pub kwh: f64,
}

/// A reading taken at the start or end of a session, with the RFID tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedReading {
    /// Meter reading.
    pub reading: Reading,
    /// Authorizing tag id.
    pub tag: String,
}

/// An event extracted from one log line.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionEvent {
    /// A charging session started.
    Start {
        /// Log line id.
        id: u64,
        /// Socket label, e.g. `socket 1`.
        socket: String,
        /// Meter reading at start.
        reading: Reading,
        /// Authorizing tag.
        tag: String,
    },
    /// A charging session stopped.
    Stop {
        /// Log line id.
        id: u64,
        /// Socket label.
        socket: String,
        /// Meter reading at stop.
        reading: Reading,
        /// Authorizing tag.
        tag: String,
    },
    /// Periodic meter value during a session.
    MeterValue {
        /// Log line id.
        id: u64,
        /// Socket label.
        socket: String,
        /// Meter reading.
        reading: Reading,
    },
}

impl TransactionEvent {
    /// Returns the log line id.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::Start { id, .. } | Self::Stop { id, .. } | Self::MeterValue { id, .. } => *id,
        }
    }

    /// Returns the socket label.
    #[must_use]
    pub fn socket(&self) -> &str {
        match self {
            Self::Start { socket, .. }
            | Self::Stop { socket, .. }
            | Self::MeterValue { socket, .. } => socket,
        }
    }
}

/// Latest known events for one socket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SocketTransactions {
    /// Most recent session start.
    pub start: Option<TaggedReading>,
    /// Most recent session stop.
    pub stop: Option<TaggedReading>,
    /// Start reading of the session that ended with `stop`.
    pub last_start: Option<Reading>,
    /// Most recent meter value.
    pub meter_value: Option<Reading>,
    /// Id of the last line applied to this socket.
    pub last_id: Option<u64>,
}

impl SocketTransactions {
    /// Applies an event for this socket.
    pub fn apply(&mut self, event: &TransactionEvent) {
        match event {
            TransactionEvent::Start {
                reading, tag, id, ..
            } => {
                self.start = Some(TaggedReading {
                    reading: reading.clone(),
                    tag: tag.clone(),
                });
                self.last_id = Some(*id);
            }
            TransactionEvent::Stop {
                reading, tag, id, ..
            } => {
                self.stop = Some(TaggedReading {
                    reading: reading.clone(),
                    tag: tag.clone(),
                });
                if let Some(start) = &self.start {
                    self.last_start = Some(start.reading.clone());
                }
                self.last_id = Some(*id);
            }
            TransactionEvent::MeterValue { reading, id, .. } => {
                self.meter_value = Some(reading.clone());
                self.last_id = Some(*id);
            }
        }
    }

    /// Energy delivered in the last completed session, in kWh.
    #[must_use]
    pub fn last_session_kwh(&self) -> Option<f64> {
        let stop = self.stop.as_ref()?;
        let start = self.last_start.as_ref()?;
        Some(stop.reading.kwh - start.kwh)
    }
}

/// Progress through the transaction log, kept across polls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionCursor {
    offset: u64,
    #[serde(skip)]
    repeats: u8,
    sockets: BTreeMap<String, SocketTransactions>,
}

impl TransactionCursor {
    /// Creates a cursor at the start of the log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the furthest log id parsed so far.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the latest events of every socket seen so far.
    #[must_use]
    pub fn sockets(&self) -> &BTreeMap<String, SocketTransactions> {
        &self.sockets
    }

    /// Returns the latest events of one socket.
    #[must_use]
    pub fn socket(&self, socket: &str) -> Option<&SocketTransactions> {
        self.sockets.get(socket)
    }

    /// Resets stall detection before a new pass over the log.
    pub fn begin_pass(&mut self) {
        self.repeats = 0;
    }

    /// Records an event, advancing the offset.
    ///
    /// Returns true once three consecutive events carried the same id.
    pub(crate) fn record(&mut self, event: &TransactionEvent) -> bool {
        let id = event.id();
        if id == self.offset {
            self.repeats = self.repeats.saturating_add(1);
        } else {
            self.offset = id;
            self.repeats = 0;
        }
        self.sockets
            .entry(event.socket().to_string())
            .or_default()
            .apply(event);
        self.repeats >= 2
    }
}

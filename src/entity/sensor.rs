// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-socket sensors over the transaction log.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::coordinator::Coordinator;
use crate::transaction::{Reading, SocketTransactions};

use super::entity_name;

/// A value exposed by one transaction sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    /// Meter value in kWh.
    Energy(f64),
    /// Wallbox local time.
    Timestamp(NaiveDateTime),
    /// RFID tag.
    Text(String),
}

impl SensorValue {
    /// The parsed time of a reading, or its raw text if the format is
    /// unknown.
    fn date(reading: &Reading) -> Self {
        reading
            .timestamp
            .map_or_else(|| Self::Text(reading.date.clone()), Self::Timestamp)
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Energy(kwh) => write!(f, "{kwh:.3}"),
            Self::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Field of [`SocketTransactions`] a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionField {
    /// Meter reading at the latest start.
    StartKwh,
    /// Time of the latest start.
    StartDate,
    /// Tag of the latest start.
    StartTag,
    /// Meter reading at the latest stop.
    StopKwh,
    /// Time of the latest stop.
    StopDate,
    /// Tag of the latest stop.
    StopTag,
    /// Start reading of the last completed session.
    LastStartKwh,
    /// Start time of the last completed session.
    LastStartDate,
    /// Latest periodic meter value.
    MeterValueKwh,
    /// Time of the latest periodic meter value.
    MeterValueDate,
    /// Energy delivered in the last completed session.
    ChargedKwh,
}

/// Every transaction field, in display order.
pub const TRANSACTION_FIELDS: &[TransactionField] = &[
    TransactionField::StartKwh,
    TransactionField::StartDate,
    TransactionField::StartTag,
    TransactionField::StopKwh,
    TransactionField::StopDate,
    TransactionField::StopTag,
    TransactionField::LastStartKwh,
    TransactionField::LastStartDate,
    TransactionField::MeterValueKwh,
    TransactionField::MeterValueDate,
    TransactionField::ChargedKwh,
];

impl TransactionField {
    /// Key suffix used in unique ids.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::StartKwh => "start_kwh",
            Self::StartDate => "start_date",
            Self::StartTag => "start_tag",
            Self::StopKwh => "stop_kwh",
            Self::StopDate => "stop_date",
            Self::StopTag => "stop_tag",
            Self::LastStartKwh => "last_start_kwh",
            Self::LastStartDate => "last_start_date",
            Self::MeterValueKwh => "mv_kwh",
            Self::MeterValueDate => "mv_date",
            Self::ChargedKwh => "charged_kwh",
        }
    }

    /// Display name suffix.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartKwh => "Transaction Start kWh",
            Self::StartDate => "Transaction Start Date",
            Self::StartTag => "Transaction Start Tag",
            Self::StopKwh => "Transaction Stop kWh",
            Self::StopDate => "Transaction Stop Date",
            Self::StopTag => "Transaction Stop Tag",
            Self::LastStartKwh => "Transaction Last Start kWh",
            Self::LastStartDate => "Transaction Last Start Date",
            Self::MeterValueKwh => "Meter Value kWh",
            Self::MeterValueDate => "Meter Value Date",
            Self::ChargedKwh => "Transaction Charged kWh",
        }
    }

    /// Returns true for energy fields.
    #[must_use]
    pub const fn is_energy(self) -> bool {
        matches!(
            self,
            Self::StartKwh
                | Self::StopKwh
                | Self::LastStartKwh
                | Self::MeterValueKwh
                | Self::ChargedKwh
        )
    }

    /// Extracts this field from a socket's transactions.
    #[must_use]
    pub fn extract(self, socket: &SocketTransactions) -> Option<SensorValue> {
        let start = socket.start.as_ref();
        let stop = socket.stop.as_ref();
        match self {
            Self::StartKwh => start.map(|s| SensorValue::Energy(s.reading.kwh)),
            Self::StartDate => start.map(|s| SensorValue::date(&s.reading)),
            Self::StartTag => start.map(|s| SensorValue::Text(s.tag.clone())),
            Self::StopKwh => stop.map(|s| SensorValue::Energy(s.reading.kwh)),
            Self::StopDate => stop.map(|s| SensorValue::date(&s.reading)),
            Self::StopTag => stop.map(|s| SensorValue::Text(s.tag.clone())),
            Self::LastStartKwh => socket.last_start.as_ref().map(|r| SensorValue::Energy(r.kwh)),
            Self::LastStartDate => socket.last_start.as_ref().map(SensorValue::date),
            Self::MeterValueKwh => socket.meter_value.as_ref().map(|r| SensorValue::Energy(r.kwh)),
            Self::MeterValueDate => socket.meter_value.as_ref().map(SensorValue::date),
            Self::ChargedKwh => socket.last_session_kwh().map(SensorValue::Energy),
        }
    }
}

/// One transaction field of one socket.
#[derive(Debug, Clone)]
pub struct TransactionSensor {
    coordinator: Arc<Coordinator>,
    socket: String,
    field: TransactionField,
    unique_id: String,
    name: String,
}

impl TransactionSensor {
    /// Creates a sensor for `socket` (1-based).
    #[must_use]
    pub fn new(coordinator: Arc<Coordinator>, socket: u8, field: TransactionField) -> Self {
        let device = coordinator.device();
        let unique_id = format!("{}_socket_{socket}_{}", device.id(), field.key());
        let name = entity_name(device, &format!("Socket {socket} {}", field.label()));
        Self {
            coordinator,
            socket: format!("socket {socket}"),
            field,
            unique_id,
            name,
        }
    }

    /// Creates every field for every socket the device reports.
    #[must_use]
    pub fn for_all_sockets(coordinator: &Arc<Coordinator>) -> Vec<Self> {
        let sockets = coordinator.device().number_of_sockets().max(1);
        (1..=sockets)
            .flat_map(|socket| {
                TRANSACTION_FIELDS
                    .iter()
                    .map(move |field| Self::new(Arc::clone(coordinator), socket, *field))
            })
            .collect()
    }

    /// Returns the socket label as it appears in the log.
    #[must_use]
    pub fn socket(&self) -> &str {
        &self.socket
    }

    /// Returns the reported field.
    #[must_use]
    pub fn field(&self) -> TransactionField {
        self.field
    }

    /// Returns `<device id>_socket_<n>_<field>`.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unit of measurement.
    #[must_use]
    pub fn unit(&self) -> Option<&'static str> {
        self.field.is_energy().then_some("kWh")
    }

    /// Returns the current value, if the log has mentioned it yet.
    #[must_use]
    pub fn value(&self) -> Option<SensorValue> {
        self.coordinator.device().with_state(|state| {
            state
                .transactions()
                .socket(&self.socket)
                .and_then(|socket| self.field.extract(socket))
        })
    }
}

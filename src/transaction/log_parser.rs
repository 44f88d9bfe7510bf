// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line parser for transaction log pages.
//!
//! Lines are classified by substring containment, in priority order, and
//! fields are extracted by position after splitting on whitespace. A line
//! that does not have the expected shape stops the page; the cursor keeps
//! the furthest id parsed before it.

use chrono::NaiveDateTime;

use super::{Reading, TransactionCursor, TransactionEvent};

/// Timestamp layouts seen in wallbox logs, most common first.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%d-%m-%Y %H:%M:%S"];

/// Why parsing of a page ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStatus {
    /// Every line was consumed; the next page should be requested.
    Continue,
    /// The page was empty.
    Empty,
    /// The `0_Empty` sentinel was reached.
    EndOfLog,
    /// Three consecutive lines carried the same id.
    Stalled,
    /// A line could not be parsed.
    Malformed(String),
}

impl PageStatus {
    /// Returns true if another page should be fetched.
    #[must_use]
    pub fn should_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Result of parsing one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    /// Events in log order.
    pub events: Vec<TransactionEvent>,
    /// Offset to request the next page from.
    pub next_offset: u64,
    /// Why parsing ended.
    pub status: PageStatus,
}

enum Line {
    Event(TransactionEvent),
    Marker,
    EndOfLog,
    Unknown,
}

/// Parses one page of the transaction log.
///
/// Events are applied to `cursor` as they are parsed. `request_offset` is
/// the offset the page was requested with; it seeds the returned
/// `next_offset`, which advances to the id of each parsed line and by one
/// for every skipped marker or unrecognized line.
///
/// # Examples
///
/// ```
/// use alfen_lib::transaction::{PageStatus, TransactionCursor, parse_page};
///
/// let page = "\
/// 4_txstart2: id 0x04, socket 1, 2024-03-01 18:02:11 1523.120kWh 04A2B3C4D5 3 1 y
/// 5_txstop2: id 0x04, socket 1, 2024-03-01 21:40:02 1541.877kWh 04A2B3C4D5 2 y
/// 0_Empty";
///
/// let mut cursor = TransactionCursor::new();
/// let outcome = parse_page(page, 0, &mut cursor);
///
/// assert_eq!(outcome.status, PageStatus::EndOfLog);
/// assert_eq!(cursor.offset(), 5);
/// let socket = cursor.socket("socket 1").unwrap();
/// assert!((socket.last_start.as_ref().unwrap().kwh - 1523.12).abs() < 1e-9);
/// ```
pub fn parse_page(text: &str, request_offset: u64, cursor: &mut TransactionCursor) -> PageOutcome {
    let mut events = Vec::new();
    let mut next_offset = request_offset;

    if text.trim().is_empty() {
        return PageOutcome {
            events,
            next_offset,
            status: PageStatus::Empty,
        };
    }

    for raw in text.lines() {
        let line = match classify(raw) {
            Ok(line) => line,
            Err(reason) => {
                tracing::warn!(line = raw, reason = %reason, "Malformed transaction line");
                return PageOutcome {
                    events,
                    next_offset,
                    status: PageStatus::Malformed(reason),
                };
            }
        };

        match line {
            Line::Marker => next_offset += 1,
            Line::Unknown => {
                tracing::debug!(line = raw, "Unknown transaction line");
                next_offset += 1;
            }
            Line::EndOfLog => {
                return PageOutcome {
                    events,
                    next_offset,
                    status: PageStatus::EndOfLog,
                };
            }
            Line::Event(event) => {
                next_offset = event.id();
                let stalled = cursor.record(&event);
                events.push(event);
                if stalled {
                    tracing::debug!(offset = cursor.offset(), "Transaction log is not advancing");
                    return PageOutcome {
                        events,
                        next_offset,
                        status: PageStatus::Stalled,
                    };
                }
            }
        }
    }

    PageOutcome {
        events,
        next_offset,
        status: PageStatus::Continue,
    }
}

fn classify(raw: &str) -> Result<Line, String> {
    let line = if raw.contains("version") {
        raw.split_once(":2,")
            .map(|(_, rest)| rest)
            .ok_or_else(|| "version line without preamble separator".to_string())?
    } else {
        raw
    };

    if line.contains("txstart") {
        let (id, socket, reading, tag) = session_fields(line)?;
        Ok(Line::Event(TransactionEvent::Start {
            id,
            socket,
            reading,
            tag,
        }))
    } else if line.contains("txstop") {
        let (id, socket, reading, tag) = session_fields(line)?;
        Ok(Line::Event(TransactionEvent::Stop {
            id,
            socket,
            reading,
            tag,
        }))
    } else if line.contains("mv") {
        let tokens = tokens(line, 6)?;
        Ok(Line::Event(TransactionEvent::MeterValue {
            id: line_id(tokens[0])?,
            socket: socket_label(tokens[1], tokens[2]),
            reading: reading(tokens[3], tokens[4], tokens[5])?,
        }))
    } else if line.contains("dto") {
        Ok(Line::Marker)
    } else if line.contains("0_Empty") {
        Ok(Line::EndOfLog)
    } else {
        Ok(Line::Unknown)
    }
}

/// Fields shared by `txstart` and `txstop` lines.
fn session_fields(line: &str) -> Result<(u64, String, Reading, String), String> {
    let tokens = tokens(line, 9)?;
    Ok((
        line_id(tokens[0])?,
        socket_label(tokens[3], tokens[4]),
        reading(tokens[5], tokens[6], tokens[7])?,
        tokens[8].to_string(),
    ))
}

fn tokens(line: &str, min: usize) -> Result<Vec<&str>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < min {
        return Err(format!("expected {min} fields, found {}", tokens.len()));
    }
    Ok(tokens)
}

fn line_id(token: &str) -> Result<u64, String> {
    let prefix = token.split('_').next().unwrap_or_default();
    prefix
        .parse()
        .map_err(|_| format!("non-numeric line id {prefix:?}"))
}

fn socket_label(word: &str, number: &str) -> String {
    let number = number.split(',').next().unwrap_or_default();
    format!("{word} {number}")
}

fn reading(date: &str, time: &str, energy: &str) -> Result<Reading, String> {
    let date = format!("{date} {time}");
    let timestamp = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&date, format).ok());
    if timestamp.is_none() {
        tracing::debug!(date = %date, "Unrecognized transaction timestamp");
    }
    let energy = energy.split("kWh").next().unwrap_or_default();
    let kwh = energy
        .parse()
        .map_err(|_| format!("invalid energy value {energy:?}"))?;
    Ok(Reading {
        date,
        timestamp,
        kwh,
    })
}

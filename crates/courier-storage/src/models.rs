// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the core record types.
//!
//! The canonical types live in `courier-core`; this module only knows how to
//! read them out of rows and how timestamps are stored.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

pub use courier_core::types::{Client, Distribution, DistributionStats, Message, SendStatus};

/// Storage format for timestamps written by this crate.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Naive layouts the CRUD layer may write (interpreted as UTC).
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp: RFC 3339, or a naive date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unparseable timestamp `{raw}`").into(),
        )
    })
}

fn status_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<SendStatus> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
    })
}

pub(crate) const DISTRIBUTION_COLUMNS: &str =
    "id, start_date, end_date, text, client_filter, was_deleted";

pub(crate) fn distribution_from_row(row: &Row<'_>) -> rusqlite::Result<Distribution> {
    Ok(Distribution {
        id: row.get::<_, i64>(0)?.into(),
        start_date: timestamp_at(row, 1)?,
        end_date: timestamp_at(row, 2)?,
        text: row.get(3)?,
        client_filter: row.get(4)?,
        was_deleted: row.get(5)?,
    })
}

pub(crate) const CLIENT_COLUMNS: &str =
    "id, mobile_number, mobile_operator_code, tag, timezone, was_deleted";

pub(crate) fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get::<_, i64>(0)?.into(),
        mobile_number: row.get(1)?,
        mobile_operator_code: row.get(2)?,
        tag: row.get(3)?,
        timezone: row.get(4)?,
        was_deleted: row.get(5)?,
    })
}

pub(crate) const MESSAGE_COLUMNS: &str =
    "id, distribution_id, client_id, send_date, send_status";

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let send_date = match row.get::<_, Option<String>>(3)? {
        Some(_) => Some(timestamp_at(row, 3)?),
        None => None,
    };
    Ok(Message {
        id: row.get::<_, i64>(0)?.into(),
        distribution_id: row.get::<_, i64>(1)?.into(),
        client_id: row.get::<_, i64>(2)?.into(),
        send_date,
        send_status: status_at(row, 4)?,
    })
}

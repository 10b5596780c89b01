// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seeding helpers for distributions and clients.
//!
//! The worker never writes these tables; the CRUD layer does. These helpers
//! stand in for it in tests and are only compiled with the `test-support`
//! feature.

use chrono::{DateTime, Utc};
use courier_core::{ClientId, CourierError, DistributionId};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{
    client_from_row, distribution_from_row, format_timestamp, Client, Distribution, CLIENT_COLUMNS,
    DISTRIBUTION_COLUMNS,
};

/// Insert a distribution and return the stored row.
pub async fn insert_distribution(
    db: &Database,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    text: &str,
    client_filter: &str,
) -> Result<Distribution, CourierError> {
    let text = text.to_string();
    let client_filter = client_filter.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO distributions (start_date, end_date, text, client_filter)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    format_timestamp(start_date),
                    format_timestamp(end_date),
                    text,
                    client_filter,
                ],
            )?;
            // Read back so callers see timestamps at stored precision.
            conn.query_row(
                &format!("SELECT {DISTRIBUTION_COLUMNS} FROM distributions WHERE id = ?1"),
                params![conn.last_insert_rowid()],
                distribution_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete a distribution. Returns whether a row was updated.
pub async fn delete_distribution(db: &Database, id: DistributionId) -> Result<bool, CourierError> {
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "UPDATE distributions SET was_deleted = 1 WHERE id = ?1",
                params![id.0],
            )?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a client. The timezone defaults to the schema's.
pub async fn insert_client(
    db: &Database,
    mobile_number: &str,
    mobile_operator_code: &str,
    tag: &str,
) -> Result<Client, CourierError> {
    let mobile_number = mobile_number.to_string();
    let mobile_operator_code = mobile_operator_code.to_string();
    let tag = tag.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO clients (mobile_number, mobile_operator_code, tag) VALUES (?1, ?2, ?3)",
                params![mobile_number, mobile_operator_code, tag],
            )?;
            conn.query_row(
                &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"),
                params![conn.last_insert_rowid()],
                client_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Soft-delete a client. Returns whether a row was updated.
pub async fn delete_client(db: &Database, id: ClientId) -> Result<bool, CourierError> {
    db.connection()
        .call(move |conn| {
            let n = conn.execute("UPDATE clients SET was_deleted = 1 WHERE id = ?1", params![id.0])?;
            Ok(n > 0)
        })
        .await
        .map_err(map_tr_err)
}

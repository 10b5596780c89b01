// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Distribution reads. Distributions belong to the CRUD layer.

use chrono::{DateTime, Utc};
use courier_core::CourierError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{distribution_from_row, format_timestamp, Distribution, DISTRIBUTION_COLUMNS};

/// Distributions not soft-deleted whose end date is at or after `now`.
///
/// Compared through `julianday` so rows written with a space separator by
/// other writers still order correctly.
pub async fn list_active(db: &Database, now: DateTime<Utc>) -> Result<Vec<Distribution>, CourierError> {
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {DISTRIBUTION_COLUMNS} FROM distributions
                 WHERE was_deleted = 0 AND julianday(end_date) >= julianday(?1)
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![now], distribution_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

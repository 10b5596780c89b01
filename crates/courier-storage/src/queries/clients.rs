// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client reads.

use courier_core::CourierError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::{client_from_row, Client, CLIENT_COLUMNS};

/// Non-deleted clients carrying exactly `tag`, by id.
pub async fn list_by_tag(db: &Database, tag: &str) -> Result<Vec<Client>, CourierError> {
    let tag = tag.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients
                 WHERE tag = ?1 AND was_deleted = 0
                 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![tag], client_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

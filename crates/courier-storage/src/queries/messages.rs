// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message (delivery record) operations.

use courier_core::{ClientId, CourierError, DistributionId, MessageId, SendStatus};
use rusqlite::{params, ErrorCode, OptionalExtension};

use crate::database::{map_tr_err, Database};
use crate::models::{format_timestamp, message_from_row, Message, MESSAGE_COLUMNS};

/// The message for a pair, if one exists.
///
/// More than one row for the pair means the uniqueness constraint was
/// bypassed; that is reported as an invariant violation.
pub async fn find_message(
    db: &Database,
    distribution_id: DistributionId,
    client_id: ClientId,
) -> Result<Option<Message>, CourierError> {
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE distribution_id = ?1 AND client_id = ?2
                 ORDER BY id ASC LIMIT 2"
            ))?;
            let rows = stmt.query_map(params![distribution_id.0, client_id.0], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)?;

    if rows.len() > 1 {
        return Err(CourierError::Invariant(format!(
            "duplicate message rows for distribution {distribution_id} and client {client_id}"
        )));
    }
    Ok(rows.into_iter().next())
}

/// Insert a `NOT_SENT` message for the pair.
///
/// A UNIQUE violation is returned as [`CourierError::Conflict`].
pub async fn insert_message(
    db: &Database,
    distribution_id: DistributionId,
    client_id: ClientId,
) -> Result<Message, CourierError> {
    let inserted = db
        .connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO messages (distribution_id, client_id, send_status)
                 VALUES (?1, ?2, ?3)",
                params![distribution_id.0, client_id.0, SendStatus::NotSent.to_string()],
            );
            match result {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation
                        && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    match inserted {
        Some(id) => Ok(Message {
            id: MessageId(id),
            distribution_id,
            client_id,
            send_date: None,
            send_status: SendStatus::NotSent,
        }),
        None => Err(CourierError::Conflict {
            distribution_id,
            client_id,
        }),
    }
}

enum UpdateResult {
    Updated,
    Missing,
    AlreadySent,
}

/// Persist status and send date.
///
/// The write is guarded so a row that is already `SENT` is never changed,
/// even by another process that read it before it became `SENT`.
pub async fn update_message(db: &Database, message: &Message) -> Result<(), CourierError> {
    let id = message.id;
    let status = message.send_status;
    let send_date = message.send_date.map(format_timestamp);

    let result = db
        .connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET send_status = ?1, send_date = ?2
                 WHERE id = ?3 AND send_status != 'SENT'",
                params![status.to_string(), send_date, id.0],
            )?;
            if changed > 0 {
                return Ok(UpdateResult::Updated);
            }
            let exists = conn
                .query_row("SELECT 1 FROM messages WHERE id = ?1", params![id.0], |_| Ok(()))
                .optional()?;
            Ok(match exists {
                Some(()) => UpdateResult::AlreadySent,
                None => UpdateResult::Missing,
            })
        })
        .await
        .map_err(map_tr_err)?;

    match result {
        UpdateResult::Updated => Ok(()),
        UpdateResult::Missing => Err(CourierError::Invariant(format!(
            "message {id} disappeared before its status could be recorded"
        ))),
        UpdateResult::AlreadySent => Err(CourierError::InvalidTransition {
            message_id: id,
            from: SendStatus::Sent,
            to: status,
        }),
    }
}

/// All messages of a distribution, by id.
pub async fn list_for_distribution(
    db: &Database,
    distribution_id: DistributionId,
) -> Result<Vec<Message>, CourierError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages WHERE distribution_id = ?1 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![distribution_id.0], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

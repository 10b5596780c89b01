// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! Statements from this process are serialized through tokio-rusqlite's
//! background thread. Other processes (the CRUD layer, other worker replicas)
//! share the same file, so cross-process safety comes from SQLite locking and
//! the schema's UNIQUE constraints.

use std::path::Path;
use std::time::Duration;

use courier_config::model::StorageConfig;
use courier_core::CourierError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the shared SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database, apply PRAGMAs and run migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, CourierError> {
        let path = config.database_path.clone();
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);

        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(CourierError::storage)?;
        }

        // Schema setup happens on a plain connection before the async one opens.
        let wal_mode = config.wal_mode;
        let setup_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), CourierError> {
            let mut conn = rusqlite::Connection::open(&setup_path).map_err(CourierError::storage)?;
            conn.busy_timeout(busy_timeout)
                .map_err(CourierError::storage)?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(CourierError::storage)?;
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| CourierError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(CourierError::storage)?;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(busy_timeout)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path = %path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying async connection, for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Map a tokio-rusqlite error into a (transient) storage error.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CourierError {
    CourierError::storage(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(path: &Path) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
            busy_timeout_ms: 1000,
        }
    }

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("courier.db");
        Database::open(&config(&path)).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_enables_wal_and_foreign_keys() {
        let dir = tempdir().unwrap();
        let db = Database::open(&config(&dir.path().join("wal.db")))
            .await
            .unwrap();

        let (mode, fk): (String, i64) = db
            .connection()
            .call(|conn| -> Result<(String, i64), rusqlite::Error> {
                let mode = conn.query_row("PRAGMA journal_mode", [], |r| r.get(0))?;
                let fk = conn.query_row("PRAGMA foreign_keys", [], |r| r.get(0))?;
                Ok((mode, fk))
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn reopening_is_idempotent() {
        let dir = tempdir().unwrap();
        let cfg = config(&dir.path().join("twice.db"));
        drop(Database::open(&cfg).await.unwrap());
        Database::open(&cfg).await.unwrap();
    }
}

// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed harness for integration tests.
//!
//! `TestHarness` opens a migrated store in a temp directory and offers
//! seeding helpers standing in for the CRUD layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use courier_config::model::StorageConfig;
use courier_core::{Client, CourierError, DispatchStore, Distribution, DistributionId, Message};
use courier_storage::fixtures;
use courier_storage::queries::messages;
use courier_storage::SqliteStore;

pub struct TestHarness {
    store: Arc<SqliteStore>,
    config: StorageConfig,
    // Keeps the database directory alive for the harness lifetime.
    _dir: TempDir,
}

impl TestHarness {
    /// Open a fresh, migrated database in a new temp directory.
    pub async fn new() -> Result<Self, CourierError> {
        let dir = tempfile::tempdir().map_err(CourierError::storage)?;
        let config = StorageConfig {
            database_path: dir.path().join("courier.db").to_string_lossy().into_owned(),
            wal_mode: true,
            busy_timeout_ms: 5000,
        };
        let store = SqliteStore::new(config.clone());
        store.initialize().await?;
        Ok(Self {
            store: Arc::new(store),
            config,
            _dir: dir,
        })
    }

    pub fn store(&self) -> Arc<SqliteStore> {
        self.store.clone()
    }

    pub fn dyn_store(&self) -> Arc<dyn DispatchStore> {
        self.store.clone()
    }

    /// Storage config pointing at the harness database, for opening a second
    /// connection (another replica) or for a binary under test.
    pub fn storage_config(&self) -> &StorageConfig {
        &self.config
    }

    pub async fn add_distribution(
        &self,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        text: &str,
        client_filter: &str,
    ) -> Result<Distribution, CourierError> {
        fixtures::insert_distribution(
            self.store.database()?,
            start_date,
            end_date,
            text,
            client_filter,
        )
        .await
    }

    pub async fn delete_distribution(&self, id: DistributionId) -> Result<(), CourierError> {
        fixtures::delete_distribution(self.store.database()?, id).await?;
        Ok(())
    }

    pub async fn add_client(&self, mobile_number: &str, tag: &str) -> Result<Client, CourierError> {
        let operator = mobile_number.get(1..4).unwrap_or("000");
        fixtures::insert_client(self.store.database()?, mobile_number, operator, tag).await
    }

    pub async fn messages(&self, distribution_id: DistributionId) -> Result<Vec<Message>, CourierError> {
        messages::list_for_distribution(self.store.database()?, distribution_id).await
    }
}

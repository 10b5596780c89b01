// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the DispatchStore trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::{
    AdapterType, Client, ClientId, CourierError, DispatchStore, Distribution, DistributionId,
    DistributionStats, HealthStatus, Message, PluginAdapter,
};

use crate::database::{map_tr_err, Database};
use crate::queries;

/// SQLite-backed store.
///
/// The database is opened by [`DispatchStore::initialize`]; every other call
/// fails with a storage error until then.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The opened database, for fixtures that seed rows directly.
    pub fn database(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| {
            CourierError::storage("store not initialized -- call initialize() first")
        })
    }

    async fn checkpoint(&self) -> Result<(), CourierError> {
        if let Some(db) = self.db.get()
            && self.config.wal_mode
        {
            db.connection()
                .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
                .await
                .map_err(map_tr_err)?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        self.database()?
            .connection()
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        self.checkpoint().await
    }
}

#[async_trait]
impl DispatchStore for SqliteStore {
    async fn initialize(&self) -> Result<(), CourierError> {
        let db = Database::open(&self.config).await?;
        self.db
            .set(db)
            .map_err(|_| CourierError::storage("store already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), CourierError> {
        self.database()?;
        self.checkpoint().await
    }

    async fn list_active_distributions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Distribution>, CourierError> {
        queries::distributions::list_active(self.database()?, now).await
    }

    async fn list_clients_by_tag(&self, tag: &str) -> Result<Vec<Client>, CourierError> {
        queries::clients::list_by_tag(self.database()?, tag).await
    }

    async fn find_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Option<Message>, CourierError> {
        queries::messages::find_message(self.database()?, distribution_id, client_id).await
    }

    async fn insert_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Message, CourierError> {
        queries::messages::insert_message(self.database()?, distribution_id, client_id).await
    }

    async fn update_message(&self, message: &Message) -> Result<(), CourierError> {
        queries::messages::update_message(self.database()?, message).await
    }

    async fn distribution_stats(&self) -> Result<Vec<DistributionStats>, CourierError> {
        queries::stats::distribution_stats(self.database()?).await
    }
}

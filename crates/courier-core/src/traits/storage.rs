// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store accessor trait for the shared distribution/client/message store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CourierError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Client, ClientId, Distribution, DistributionId, DistributionStats, Message};

/// Adapter for the store shared with the CRUD layer.
///
/// Distributions and clients are read-only here. Messages are written only by
/// the dispatch worker, and the store must enforce that at most one message
/// exists per (distribution, client) pair even across processes.
#[async_trait]
pub trait DispatchStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connections, etc.).
    async fn initialize(&self) -> Result<(), CourierError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), CourierError>;

    /// Distributions with `end_date >= now` that are not soft-deleted, ordered by id.
    async fn list_active_distributions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Distribution>, CourierError>;

    /// Non-deleted clients whose tag equals `tag`, ordered by id.
    async fn list_clients_by_tag(&self, tag: &str) -> Result<Vec<Client>, CourierError>;

    async fn find_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Option<Message>, CourierError>;

    /// Inserts a `NOT_SENT` message for the pair.
    ///
    /// Fails with [`CourierError::Conflict`] if the pair already has a message.
    async fn insert_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Message, CourierError>;

    /// Persists status and send date of an existing message.
    ///
    /// Rejects the write with [`CourierError::InvalidTransition`] if the stored
    /// row is already `SENT`.
    async fn update_message(&self, message: &Message) -> Result<(), CourierError>;

    /// Delivery counters for every distribution, including deleted ones.
    async fn distribution_stats(&self) -> Result<Vec<DistributionStats>, CourierError>;
}

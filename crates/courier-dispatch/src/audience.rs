// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audience resolution: which clients a distribution is addressed to.

use std::sync::Arc;
use std::time::Duration;

use courier_core::{Client, CourierError, DispatchStore, Distribution};
use tracing::debug;

use crate::bounded::bounded;

/// Resolves the clients whose tag matches a distribution's filter.
///
/// Soft-deleted clients are excluded by the store query.
pub struct AudienceResolver {
    store: Arc<dyn DispatchStore>,
    store_timeout: Duration,
}

impl AudienceResolver {
    pub fn new(store: Arc<dyn DispatchStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Clients to address for `distribution`. An empty audience is not an error.
    pub async fn resolve(&self, distribution: &Distribution) -> Result<Vec<Client>, CourierError> {
        let clients = bounded(
            self.store_timeout,
            self.store.list_clients_by_tag(&distribution.client_filter),
        )
        .await?;
        debug!(
            distribution_id = %distribution.id,
            tag = %distribution.client_filter,
            audience = clients.len(),
            "audience resolved"
        );
        Ok(clients)
    }
}

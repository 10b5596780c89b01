// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery ledger: one message row per (distribution, client) pair.
//!
//! Uniqueness is enforced by the store. The ledger's part is to turn an
//! insert conflict into a re-read and to refuse transitions the status
//! state machine forbids.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use courier_core::{ClientId, CourierError, DispatchStore, DistributionId, Message, SendStatus};
use tracing::debug;

use crate::bounded::bounded;

pub struct DeliveryLedger {
    store: Arc<dyn DispatchStore>,
    store_timeout: Duration,
}

impl DeliveryLedger {
    pub fn new(store: Arc<dyn DispatchStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Get or create the message for a pair.
    ///
    /// A new message starts `NOT_SENT` without a send date. When another
    /// worker wins the insert race, its row is re-read and returned.
    pub async fn ensure_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Message, CourierError> {
        if let Some(existing) = self.find(distribution_id, client_id).await? {
            return Ok(existing);
        }

        match bounded(
            self.store_timeout,
            self.store.insert_message(distribution_id, client_id),
        )
        .await
        {
            Ok(created) => {
                debug!(
                    message_id = %created.id,
                    distribution_id = %distribution_id,
                    client_id = %client_id,
                    "message created"
                );
                Ok(created)
            }
            Err(CourierError::Conflict { .. }) => {
                debug!(
                    distribution_id = %distribution_id,
                    client_id = %client_id,
                    "message created concurrently, re-reading"
                );
                self.find(distribution_id, client_id).await?.ok_or_else(|| {
                    CourierError::Invariant(format!(
                        "insert for distribution {distribution_id} and client {client_id} \
                         conflicted but no message row exists"
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Record a new status, returning the updated message.
    ///
    /// `sent_at` is stamped only for `SENT`; other statuses clear the date.
    /// Transitions out of `SENT` (or back to `NOT_SENT`) are rejected.
    pub async fn update_status(
        &self,
        message: &Message,
        new_status: SendStatus,
        sent_at: DateTime<Utc>,
    ) -> Result<Message, CourierError> {
        if !message.send_status.can_transition_to(new_status) {
            return Err(CourierError::InvalidTransition {
                message_id: message.id,
                from: message.send_status,
                to: new_status,
            });
        }

        let updated = Message {
            send_status: new_status,
            send_date: (new_status == SendStatus::Sent).then_some(sent_at),
            ..message.clone()
        };
        bounded(self.store_timeout, self.store.update_message(&updated)).await?;
        debug!(message_id = %updated.id, status = %new_status, "message status recorded");
        Ok(updated)
    }

    async fn find(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Option<Message>, CourierError> {
        bounded(
            self.store_timeout,
            self.store.find_message(distribution_id, client_id),
        )
        .await
    }
}

// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store for deterministic dispatch tests.
//!
//! Behaves like the SQLite store where the dispatch loop can observe it:
//! one message per pair (`Conflict` otherwise), `SENT` rows cannot be
//! overwritten, soft-deleted rows are filtered out. Failures and latency can
//! be injected per operation.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courier_core::{
    AdapterType, Client, ClientId, CourierError, DispatchStore, Distribution, DistributionId,
    DistributionStats, HealthStatus, Message, MessageId, PluginAdapter, SendStatus,
};

#[derive(Default)]
struct Faults {
    distribution_queries: u32,
    client_queries: u32,
    finds: u32,
    inserts: u32,
    updates: u32,
    race_next_insert: bool,
}

#[derive(Default)]
struct State {
    distributions: BTreeMap<DistributionId, Distribution>,
    clients: BTreeMap<ClientId, Client>,
    messages: BTreeMap<MessageId, Message>,
    last_id: i64,
    faults: Faults,
    latency: Duration,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn pair(&self, distribution_id: DistributionId, client_id: ClientId) -> Vec<Message> {
        self.messages
            .values()
            .filter(|m| m.distribution_id == distribution_id && m.client_id == client_id)
            .cloned()
            .collect()
    }

    fn create_message(&mut self, distribution_id: DistributionId, client_id: ClientId) -> Message {
        let message = Message {
            id: MessageId(self.next_id()),
            distribution_id,
            client_id,
            send_date: None,
            send_status: SendStatus::NotSent,
        };
        self.messages.insert(message.id, message.clone());
        message
    }
}

fn take(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

fn injected(op: &str) -> CourierError {
    CourierError::storage(format!("injected {op} failure"))
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn pause(&self) {
        let latency = self.state().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    pub fn add_distribution(
        &self,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        text: &str,
        client_filter: &str,
    ) -> Distribution {
        let mut state = self.state();
        let distribution = Distribution {
            id: DistributionId(state.next_id()),
            start_date,
            end_date,
            text: text.to_string(),
            client_filter: client_filter.to_string(),
            was_deleted: false,
        };
        state
            .distributions
            .insert(distribution.id, distribution.clone());
        distribution
    }

    pub fn delete_distribution(&self, id: DistributionId) {
        if let Some(d) = self.state().distributions.get_mut(&id) {
            d.was_deleted = true;
        }
    }

    pub fn add_client(&self, mobile_number: &str, tag: &str) -> Client {
        let mut state = self.state();
        let client = Client {
            id: ClientId(state.next_id()),
            mobile_number: mobile_number.to_string(),
            mobile_operator_code: mobile_number.get(1..4).unwrap_or("000").to_string(),
            tag: tag.to_string(),
            timezone: "Europe/Moscow".to_string(),
            was_deleted: false,
        };
        state.clients.insert(client.id, client.clone());
        client
    }

    pub fn delete_client(&self, id: ClientId) {
        if let Some(c) = self.state().clients.get_mut(&id) {
            c.was_deleted = true;
        }
    }

    /// Overwrite a stored message, bypassing transition checks.
    pub fn put_message(&self, message: Message) {
        self.state().messages.insert(message.id, message);
    }

    /// All messages, by id.
    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.values().cloned().collect()
    }

    pub fn message_for(&self, distribution_id: DistributionId, client_id: ClientId) -> Option<Message> {
        self.state().pair(distribution_id, client_id).into_iter().next()
    }

    pub fn fail_next_distribution_queries(&self, n: u32) {
        self.state().faults.distribution_queries = n;
    }

    pub fn fail_next_client_queries(&self, n: u32) {
        self.state().faults.client_queries = n;
    }

    pub fn fail_next_finds(&self, n: u32) {
        self.state().faults.finds = n;
    }

    pub fn fail_next_inserts(&self, n: u32) {
        self.state().faults.inserts = n;
    }

    pub fn fail_next_updates(&self, n: u32) {
        self.state().faults.updates = n;
    }

    /// Make the next insert behave as if another worker inserted the same
    /// pair first: the row is created and the caller gets `Conflict`.
    pub fn race_next_insert(&self) {
        self.state().faults.race_next_insert = true;
    }

    /// Delay every trait call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl DispatchStore for MemoryStore {
    async fn initialize(&self) -> Result<(), CourierError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), CourierError> {
        Ok(())
    }

    async fn list_active_distributions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Distribution>, CourierError> {
        self.pause().await;
        let mut state = self.state();
        if take(&mut state.faults.distribution_queries) {
            return Err(injected("distribution query"));
        }
        Ok(state
            .distributions
            .values()
            .filter(|d| d.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn list_clients_by_tag(&self, tag: &str) -> Result<Vec<Client>, CourierError> {
        self.pause().await;
        let mut state = self.state();
        if take(&mut state.faults.client_queries) {
            return Err(injected("client query"));
        }
        Ok(state
            .clients
            .values()
            .filter(|c| c.tag == tag && !c.was_deleted)
            .cloned()
            .collect())
    }

    async fn find_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Option<Message>, CourierError> {
        self.pause().await;
        let mut state = self.state();
        if take(&mut state.faults.finds) {
            return Err(injected("find"));
        }
        let rows = state.pair(distribution_id, client_id);
        if rows.len() > 1 {
            return Err(CourierError::Invariant(format!(
                "duplicate message rows for distribution {distribution_id} and client {client_id}"
            )));
        }
        Ok(rows.into_iter().next())
    }

    async fn insert_message(
        &self,
        distribution_id: DistributionId,
        client_id: ClientId,
    ) -> Result<Message, CourierError> {
        self.pause().await;
        let mut state = self.state();
        if take(&mut state.faults.inserts) {
            return Err(injected("insert"));
        }
        if std::mem::take(&mut state.faults.race_next_insert) {
            state.create_message(distribution_id, client_id);
        }
        if !state.pair(distribution_id, client_id).is_empty() {
            return Err(CourierError::Conflict {
                distribution_id,
                client_id,
            });
        }
        Ok(state.create_message(distribution_id, client_id))
    }

    async fn update_message(&self, message: &Message) -> Result<(), CourierError> {
        self.pause().await;
        let mut state = self.state();
        if take(&mut state.faults.updates) {
            return Err(injected("update"));
        }
        let Some(stored) = state.messages.get_mut(&message.id) else {
            return Err(CourierError::Invariant(format!(
                "message {} does not exist",
                message.id
            )));
        };
        if stored.send_status == SendStatus::Sent {
            return Err(CourierError::InvalidTransition {
                message_id: message.id,
                from: SendStatus::Sent,
                to: message.send_status,
            });
        }
        stored.send_status = message.send_status;
        stored.send_date = message.send_date;
        Ok(())
    }

    async fn distribution_stats(&self) -> Result<Vec<DistributionStats>, CourierError> {
        let state = self.state();
        Ok(state
            .distributions
            .values()
            .map(|d| {
                let count = |status: SendStatus| {
                    state
                        .messages
                        .values()
                        .filter(|m| m.distribution_id == d.id && m.send_status == status)
                        .count() as u64
                };
                let (sent, failed, not_sent) = (
                    count(SendStatus::Sent),
                    count(SendStatus::Fail),
                    count(SendStatus::NotSent),
                );
                DistributionStats {
                    distribution_id: d.id,
                    text: d.text.clone(),
                    end_date: d.end_date,
                    was_deleted: d.was_deleted,
                    total: sent + failed + not_sent,
                    sent,
                    failed,
                    not_sent,
                }
            })
            .collect())
    }
}

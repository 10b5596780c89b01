// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock sender with scripted per-client outcomes.
//!
//! Unscripted sends succeed. Every call is logged, and the peak number of
//! concurrent sends is tracked.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use courier_core::{
    AdapterType, Client, ClientId, CourierError, Distribution, HealthStatus, Message, MessageId,
    PluginAdapter, SendOutcome, SenderAdapter,
};

/// One recorded `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    pub message_id: MessageId,
    pub client_id: ClientId,
    pub phone: String,
    pub text: String,
}

enum Step {
    Respond(SendOutcome),
    /// Sleep before answering, to exercise timeouts.
    Stall(Duration),
}

#[derive(Default)]
struct Script {
    steps: HashMap<ClientId, VecDeque<Step>>,
    calls: Vec<SentCall>,
    delay: Duration,
}

#[derive(Default)]
pub struct MockSender {
    script: Mutex<Script>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue outcomes for successive sends to `client_id`.
    pub fn script_outcomes(&self, client_id: ClientId, outcomes: impl IntoIterator<Item = SendOutcome>) {
        self.script()
            .steps
            .entry(client_id)
            .or_default()
            .extend(outcomes.into_iter().map(Step::Respond));
    }

    /// Make the next send to `client_id` stall for `duration` before succeeding.
    pub fn stall_next(&self, client_id: ClientId, duration: Duration) {
        self.script()
            .steps
            .entry(client_id)
            .or_default()
            .push_back(Step::Stall(duration));
    }

    /// Delay every send by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.script().delay = delay;
    }

    pub fn calls(&self) -> Vec<SentCall> {
        self.script().calls.clone()
    }

    pub fn calls_for(&self, client_id: ClientId) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|c| c.client_id == client_id)
            .count()
    }

    /// Highest number of sends observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MockSender {
    fn name(&self) -> &str {
        "mock-sender"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, CourierError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl SenderAdapter for MockSender {
    async fn send(
        &self,
        message: &Message,
        client: &Client,
        distribution: &Distribution,
    ) -> SendOutcome {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);

        let (step, delay) = {
            let mut script = self.script();
            script.calls.push(SentCall {
                message_id: message.id,
                client_id: client.id,
                phone: client.mobile_number.clone(),
                text: distribution.text.clone(),
            });
            let step = script
                .steps
                .get_mut(&client.id)
                .and_then(VecDeque::pop_front);
            (step, script.delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let outcome = match step {
            Some(Step::Respond(outcome)) => outcome,
            Some(Step::Stall(duration)) => {
                tokio::time::sleep(duration).await;
                SendOutcome::Sent
            }
            None => SendOutcome::Sent,
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch loop.
//!
//! Each cycle walks the active distributions in id order. For one
//! distribution the audience is resolved, every message is ensured, and only
//! then are the not-yet-sent messages handed to the sender, a bounded number
//! at a time. All of a distribution's sends and status writes finish before
//! the next distribution starts. Cycles never overlap.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use courier_config::model::{DispatchConfig, SenderConfig};
use courier_core::{
    Client, CourierError, DispatchStore, Distribution, Message, SendOutcome, SendStatus,
    SenderAdapter,
};
use futures::stream::{self, StreamExt};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::audience::AudienceResolver;
use crate::bounded::bounded;
use crate::ledger::DeliveryLedger;

/// Slack added to the sender's own timeout before the loop gives up on a send.
const SEND_GRACE: Duration = Duration::from_secs(2);

/// Tunables for the dispatch loop.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub interval: Duration,
    pub max_concurrent_sends: usize,
    pub respect_start_date: bool,
    pub store_timeout: Duration,
    /// Hard bound on one send; elapsed sends are recorded as `FAIL`.
    pub send_timeout: Duration,
}

impl DispatchSettings {
    pub fn from_config(dispatch: &DispatchConfig, sender: &SenderConfig) -> Self {
        Self {
            interval: Duration::from_secs(dispatch.interval_secs),
            max_concurrent_sends: dispatch.max_concurrent_sends.max(1),
            respect_start_date: dispatch.respect_start_date,
            store_timeout: Duration::from_secs(dispatch.store_timeout_secs),
            send_timeout: Duration::from_secs(sender.timeout_secs) + SEND_GRACE,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default(), &SenderConfig::default())
    }
}

/// Counters for one dispatch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Active distributions returned by the store.
    pub distributions: usize,
    /// Distributions abandoned because of a store error.
    pub distributions_failed: usize,
    /// Distributions skipped because their start date is in the future.
    pub distributions_not_started: usize,
    pub messages_ensured: usize,
    /// Messages skipped because they are already `SENT`.
    pub already_sent: usize,
    pub sent: usize,
    pub failed: usize,
    /// Pairs whose message could not be ensured or whose status could not be recorded.
    pub record_errors: usize,
    /// Shutdown was requested before the cycle finished.
    pub interrupted: bool,
}

impl CycleReport {
    fn merge(&mut self, other: DistributionReport) {
        self.messages_ensured += other.ensured;
        self.already_sent += other.already_sent;
        self.sent += other.sent;
        self.failed += other.failed;
        self.record_errors += other.record_errors;
    }
}

#[derive(Debug, Default)]
struct DistributionReport {
    ensured: usize,
    already_sent: usize,
    sent: usize,
    failed: usize,
    record_errors: usize,
}

enum Delivery {
    Recorded(SendStatus),
    RecordFailed,
    NotAttempted,
}

pub struct DispatchLoop {
    store: Arc<dyn DispatchStore>,
    sender: Arc<dyn SenderAdapter>,
    audience: AudienceResolver,
    ledger: DeliveryLedger,
    settings: DispatchSettings,
}

impl DispatchLoop {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        sender: Arc<dyn SenderAdapter>,
        settings: DispatchSettings,
    ) -> Self {
        info!(
            store = store.name(),
            sender = sender.name(),
            interval_secs = settings.interval.as_secs(),
            max_concurrent_sends = settings.max_concurrent_sends,
            "dispatch loop initialized"
        );
        Self {
            audience: AudienceResolver::new(store.clone(), settings.store_timeout),
            ledger: DeliveryLedger::new(store.clone(), settings.store_timeout),
            store,
            sender,
            settings,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Run cycles on the configured interval until `cancel` fires.
    ///
    /// The first cycle starts immediately. A running cycle is never aborted:
    /// once shutdown is requested it stops starting new sends, lets in-flight
    /// ones finish or time out, and records them.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), CourierError> {
        info!("dispatch loop running");
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatch loop");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.cycle(Utc::now(), &cancel).await;
                    log_report(&report);
                }
            }
        }

        self.store.close().await?;
        info!("dispatch loop stopped");
        Ok(())
    }

    /// Run one full cycle as of `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        self.cycle(now, &CancellationToken::new()).await
    }

    async fn cycle(&self, now: DateTime<Utc>, cancel: &CancellationToken) -> CycleReport {
        let mut report = CycleReport::default();

        let distributions = match bounded(
            self.settings.store_timeout,
            self.store.list_active_distributions(now),
        )
        .await
        {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "failed to list active distributions, retrying next cycle");
                return report;
            }
        };
        report.distributions = distributions.len();

        for distribution in &distributions {
            if cancel.is_cancelled() {
                report.interrupted = true;
                break;
            }
            if !distribution.is_active_at(now) {
                continue;
            }
            if self.settings.respect_start_date && !distribution.has_started_at(now) {
                debug!(distribution_id = %distribution.id, "distribution not started yet");
                report.distributions_not_started += 1;
                continue;
            }

            match self.process_distribution(distribution, cancel).await {
                Ok(partial) => report.merge(partial),
                Err(e) => {
                    report.distributions_failed += 1;
                    warn!(
                        distribution_id = %distribution.id,
                        error = %e,
                        "distribution aborted for this cycle"
                    );
                }
            }
        }

        if cancel.is_cancelled() {
            report.interrupted = true;
        }
        report
    }

    async fn process_distribution(
        &self,
        distribution: &Distribution,
        cancel: &CancellationToken,
    ) -> Result<DistributionReport, CourierError> {
        let audience = self.audience.resolve(distribution).await?;
        let mut report = DistributionReport::default();

        // Every message exists before the first send.
        let mut pending: Vec<(Message, Client)> = Vec::with_capacity(audience.len());
        for client in audience {
            match self.ledger.ensure_message(distribution.id, client.id).await {
                Ok(message) => {
                    report.ensured += 1;
                    if message.send_status.is_terminal() {
                        report.already_sent += 1;
                    } else {
                        pending.push((message, client));
                    }
                }
                Err(e) => {
                    report.record_errors += 1;
                    log_record_error(&e, distribution, &client, "failed to ensure message");
                }
            }
        }

        let deliveries: Vec<Delivery> = stream::iter(pending)
            .map(|(message, client)| self.deliver(message, client, distribution, cancel))
            .buffer_unordered(self.settings.max_concurrent_sends)
            .collect()
            .await;

        for delivery in deliveries {
            match delivery {
                Delivery::Recorded(SendStatus::Sent) => report.sent += 1,
                Delivery::Recorded(_) => report.failed += 1,
                Delivery::RecordFailed => report.record_errors += 1,
                Delivery::NotAttempted => {}
            }
        }

        debug!(
            distribution_id = %distribution.id,
            ensured = report.ensured,
            sent = report.sent,
            failed = report.failed,
            "distribution processed"
        );
        Ok(report)
    }

    async fn deliver(
        &self,
        message: Message,
        client: Client,
        distribution: &Distribution,
        cancel: &CancellationToken,
    ) -> Delivery {
        if cancel.is_cancelled() {
            return Delivery::NotAttempted;
        }

        let outcome = match tokio::time::timeout(
            self.settings.send_timeout,
            self.sender.send(&message, &client, distribution),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => SendOutcome::failed(format!(
                "no answer within {:?}",
                self.settings.send_timeout
            )),
        };

        let status = outcome.status();
        if let SendOutcome::Failed { reason } = &outcome {
            debug!(message_id = %message.id, client_id = %client.id, reason = %reason, "send failed");
        }

        match self.ledger.update_status(&message, status, Utc::now()).await {
            Ok(_) => Delivery::Recorded(status),
            Err(e) => {
                log_record_error(&e, distribution, &client, "failed to record send outcome");
                Delivery::RecordFailed
            }
        }
    }
}

fn log_record_error(e: &CourierError, distribution: &Distribution, client: &Client, what: &str) {
    if e.is_invariant_violation() {
        error!(
            distribution_id = %distribution.id,
            client_id = %client.id,
            error = %e,
            "{what}"
        );
    } else {
        warn!(
            distribution_id = %distribution.id,
            client_id = %client.id,
            error = %e,
            "{what}"
        );
    }
}

fn log_report(report: &CycleReport) {
    info!(
        distributions = report.distributions,
        distributions_failed = report.distributions_failed,
        not_started = report.distributions_not_started,
        ensured = report.messages_ensured,
        already_sent = report.already_sent,
        sent = report.sent,
        failed = report.failed,
        record_errors = report.record_errors,
        interrupted = report.interrupted,
        "dispatch cycle complete"
    );
}

// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP sender adapter for the Courier dispatch worker.
//!
//! Implements [`SenderAdapter`] by posting each message to the remote send
//! endpoint. Every outcome other than a 2xx response is reported as
//! [`SendOutcome::Failed`]; nothing is retried here.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::SenderConfig;
use courier_core::traits::{PluginAdapter, SenderAdapter};
use courier_core::{
    AdapterType, Client, CourierError, Distribution, HealthStatus, Message, SendOutcome,
};
use tracing::{debug, info, warn};

use crate::client::SendClient;
use crate::types::SendRequest;

/// Sender backed by the HTTP send endpoint.
pub struct HttpSender {
    client: SendClient,
    timeout: Duration,
}

impl HttpSender {
    /// Build a sender from configuration. `sender.auth_token` must be set.
    pub fn new(config: &SenderConfig) -> Result<Self, CourierError> {
        let token = config.auth_token.as_deref().ok_or_else(|| {
            CourierError::Config("sender.auth_token is required to send messages".into())
        })?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = SendClient::new(&config.base_url, token, timeout)?;
        info!(base_url = %config.base_url, timeout_secs = config.timeout_secs, "HTTP sender initialized");
        Ok(Self { client, timeout })
    }

    /// Per-request timeout the client enforces.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl PluginAdapter for HttpSender {
    fn name(&self) -> &str {
        "http"
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
impl SenderAdapter for HttpSender {
    async fn send(
        &self,
        message: &Message,
        client: &Client,
        distribution: &Distribution,
    ) -> SendOutcome {
        let request = SendRequest {
            id: message.id.0,
            phone: client.mobile_number.clone(),
            text: distribution.text.clone(),
        };

        match self.client.post(&request).await {
            Ok(delivery) if delivery.status.is_success() => {
                debug!(message_id = %message.id, status = %delivery.status, "message accepted");
                SendOutcome::Sent
            }
            Ok(delivery) => {
                let detail = delivery
                    .response()
                    .map(|r| r.message)
                    .unwrap_or(delivery.body);
                warn!(
                    message_id = %message.id,
                    status = %delivery.status,
                    detail = %detail,
                    "send endpoint rejected message"
                );
                SendOutcome::failed(format!("endpoint returned {}", delivery.status))
            }
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "send request failed");
                SendOutcome::failed(e.to_string())
            }
        }
    }
}

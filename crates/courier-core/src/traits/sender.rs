// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sender adapter trait for the outbound delivery endpoint.

use async_trait::async_trait;

use crate::traits::adapter::PluginAdapter;
use crate::types::{Client, Distribution, Message, SendOutcome};

/// Adapter that delivers one message to one client.
///
/// Implementations perform exactly one outbound attempt per call and never
/// retry; every failure mode is folded into [`SendOutcome::Failed`].
#[async_trait]
pub trait SenderAdapter: PluginAdapter {
    async fn send(
        &self,
        message: &Message,
        client: &Client,
        distribution: &Distribution,
    ) -> SendOutcome;
}

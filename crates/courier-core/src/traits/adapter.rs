// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity and lifecycle shared by the store and sender adapters.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{AdapterType, HealthStatus};

/// Common surface of every backend the dispatch loop talks to.
///
/// `serve` uses it to log which backends are wired in, check them at startup,
/// and release them on shutdown.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Short backend name used in log fields, e.g. `sqlite` or `http`.
    fn name(&self) -> &str;

    fn version(&self) -> semver::Version;

    fn adapter_type(&self) -> AdapterType;

    /// Cheap liveness check. A store runs a trivial query; the HTTP sender
    /// reports healthy without contacting the endpoint.
    async fn health_check(&self) -> Result<HealthStatus, CourierError>;

    /// Flush and release backend resources. Called once, after the last cycle.
    async fn shutdown(&self) -> Result<(), CourierError>;
}

// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier dispatch worker.
//!
//! Defines the distribution, client, and message records shared with the
//! CRUD layer, the delivery status state machine, the error type, and the
//! store and sender adapter traits implemented by the other workspace crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{
    AdapterType, Client, ClientId, Distribution, DistributionId, DistributionStats,
    HealthStatus, Message, MessageId, SendOutcome, SendStatus,
};

pub use traits::{DispatchStore, PluginAdapter, SenderAdapter};

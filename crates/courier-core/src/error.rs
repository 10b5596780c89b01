// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier dispatch worker.

use thiserror::Error;

use crate::types::{ClientId, DistributionId, MessageId, SendStatus};

/// The primary error type used across all Courier adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (connection failure, lock contention, query failure).
    ///
    /// Treated as transient: the affected unit of work is retried next cycle.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A message row already exists for the (distribution, client) pair.
    #[error("message already exists for distribution {distribution_id} and client {client_id}")]
    Conflict {
        distribution_id: DistributionId,
        client_id: ClientId,
    },

    /// Sender construction or transport setup errors.
    ///
    /// Individual send failures are reported as `SendOutcome::Failed`, not as this variant.
    #[error("sender error: {message}")]
    Sender {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An attempted status transition that the delivery state machine forbids.
    #[error("illegal status transition for message {message_id}: {from} -> {to}")]
    InvalidTransition {
        message_id: MessageId,
        from: SendStatus,
        to: SendStatus,
    },

    /// A persisted-state invariant was found broken (e.g. duplicate message rows).
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Wraps any error as a storage error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage {
            source: source.into(),
        }
    }

    /// Returns true for errors that should simply be retried on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Timeout { .. })
    }

    /// Returns true for errors that indicate broken delivery invariants.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. } | Self::Invariant(_))
    }
}

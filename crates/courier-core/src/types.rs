// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, the sender, and the dispatch loop.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

row_id!(
    /// Identifier of a distribution row.
    DistributionId
);
row_id!(
    /// Identifier of a client row.
    ClientId
);
row_id!(
    /// Identifier of a message (delivery record) row.
    ///
    /// Also used as the idempotency key of the outbound send request.
    MessageId
);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Sender,
}

/// Delivery status of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    /// Created, no delivery attempt recorded yet.
    NotSent,
    /// Delivered. Terminal.
    Sent,
    /// Last delivery attempt failed; eligible for retry.
    Fail,
}

impl SendStatus {
    /// Whether no further transition may leave this status.
    pub fn is_terminal(self) -> bool {
        self == Self::Sent
    }

    /// Legal transitions: `NOT_SENT|FAIL -> SENT|FAIL`. Nothing leaves `SENT`.
    pub fn can_transition_to(self, next: SendStatus) -> bool {
        matches!(
            (self, next),
            (Self::NotSent | Self::Fail, Self::Sent | Self::Fail)
        )
    }
}

/// A scheduled broadcast of text to the clients matching `client_filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub id: DistributionId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub text: String,
    /// Tag that a client must carry to be part of the audience.
    pub client_filter: String,
    pub was_deleted: bool,
}

impl Distribution {
    /// Active while `now <= end_date` (inclusive) and not soft-deleted.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.was_deleted && now <= self.end_date
    }

    pub fn has_started_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now
    }
}

/// A message recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub mobile_number: String,
    pub mobile_operator_code: String,
    pub tag: String,
    /// IANA zone name, e.g. "Europe/Moscow".
    pub timezone: String,
    pub was_deleted: bool,
}

/// The delivery record for one (distribution, client) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub distribution_id: DistributionId,
    pub client_id: ClientId,
    /// Set only once the message is `SENT`.
    pub send_date: Option<DateTime<Utc>>,
    pub send_status: SendStatus,
}

/// Classified result of a single outbound send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The remote endpoint answered with a success status.
    Sent,
    /// Anything else: non-success status, transport error, timeout.
    Failed { reason: String },
}

impl SendOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// The message status this outcome should be recorded as.
    pub fn status(&self) -> SendStatus {
        match self {
            Self::Sent => SendStatus::Sent,
            Self::Failed { .. } => SendStatus::Fail,
        }
    }
}

/// Per-distribution delivery counters for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub distribution_id: DistributionId,
    pub text: String,
    pub end_date: DateTime<Utc>,
    pub was_deleted: bool,
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub not_sent: u64,
}

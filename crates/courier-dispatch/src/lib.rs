// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch worker for the Courier distribution system.
//!
//! - [`AudienceResolver`] picks the clients a distribution targets.
//! - [`DeliveryLedger`] keeps exactly one message per (distribution, client)
//!   and guards status transitions.
//! - [`DispatchLoop`] drives both on a fixed interval and hands unsent
//!   messages to a [`courier_core::SenderAdapter`].
//! - [`shutdown`] turns process signals into a cancellation token.

pub mod audience;
mod bounded;
pub mod dispatcher;
pub mod ledger;
pub mod shutdown;

pub use audience::AudienceResolver;
pub use dispatcher::{CycleReport, DispatchLoop, DispatchSettings};
pub use ledger::DeliveryLedger;

// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier.
//!
//! - [`MemoryStore`]: in-memory `DispatchStore` with pair uniqueness and fault injection
//! - [`MockSender`]: `SenderAdapter` with scripted outcomes and a call log
//! - [`TestHarness`]: temp-file SQLite store with seeding helpers

pub mod harness;
pub mod mock_sender;
pub mod mock_store;

pub use harness::TestHarness;
pub use mock_sender::{MockSender, SentCall};
pub use mock_store::MemoryStore;

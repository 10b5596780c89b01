// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite store accessor for the Courier dispatch worker.
//!
//! Reads distributions and clients written by the CRUD layer and owns the
//! message rows. Schema changes ship as embedded refinery migrations.

pub mod adapter;
pub mod database;
#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;

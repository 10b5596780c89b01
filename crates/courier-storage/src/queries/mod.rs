// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per table, plus reporting.

pub mod clients;
pub mod distributions;
pub mod messages;
pub mod stats;

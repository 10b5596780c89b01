// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier status` command implementation.
//!
//! Reads per-distribution delivery counters from the store. Never writes
//! message rows.

use std::io::IsTerminal;
use std::path::Path;

use chrono::{DateTime, Utc};
use courier_config::CourierConfig;
use courier_core::{CourierError, DispatchStore, DistributionStats};
use courier_storage::SqliteStore;
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub database_path: String,
    pub distributions: Vec<DistributionStats>,
}

/// Run the `courier status` command.
///
/// With `--json`, prints structured JSON for scripting. With `--plain` or
/// when stdout is not a TTY, disables colors.
pub async fn run_status(config: &CourierConfig, json: bool, plain: bool) -> Result<(), CourierError> {
    let path = &config.storage.database_path;
    if !Path::new(path).exists() {
        return Err(CourierError::Config(format!(
            "no database at {path}; has `courier serve` run yet?"
        )));
    }

    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;
    let stats = store.distribution_stats().await;
    store.close().await?;
    let stats = stats?;

    if json {
        let resp = StatusResponse {
            database_path: path.clone(),
            distributions: stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&resp).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_table(&stats, Utc::now(), use_color);
    }
    Ok(())
}

fn state_label(stats: &DistributionStats, now: DateTime<Utc>) -> &'static str {
    if stats.was_deleted {
        "deleted"
    } else if now <= stats.end_date {
        "active"
    } else {
        "ended"
    }
}

fn print_table(stats: &[DistributionStats], now: DateTime<Utc>, use_color: bool) {
    println!();
    println!("  courier status");
    println!("  {}", "-".repeat(64));

    if stats.is_empty() {
        println!("    no distributions");
        println!();
        return;
    }

    println!(
        "    {:>6}  {:<8}  {:>6}  {:>6}  {:>6}  {:>8}  {}",
        "id", "state", "total", "sent", "failed", "not sent", "ends"
    );
    for s in stats {
        let state = state_label(s, now);
        let state = if use_color {
            use colored::Colorize;
            match state {
                "active" => state.green().to_string(),
                "deleted" => state.red().to_string(),
                _ => state.dimmed().to_string(),
            }
        } else {
            state.to_string()
        };
        println!(
            "    {:>6}  {:<8}  {:>6}  {:>6}  {:>6}  {:>8}  {}",
            s.distribution_id,
            state,
            s.total,
            s.sent,
            s.failed,
            s.not_sent,
            s.end_date.format("%Y-%m-%d %H:%M")
        );
    }
    println!();
}

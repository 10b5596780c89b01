// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks run after deserialization.
//!
//! All problems are collected rather than stopping at the first one.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.worker.name.trim().is_empty() {
        errors.push(ConfigError::invalid("worker.name", "must not be empty"));
    }
    if !LOG_LEVELS.contains(&config.worker.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::invalid(
            "worker.log_level",
            format!(
                "must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                config.worker.log_level
            ),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path", "must not be empty"));
    }

    let at_least_one = [
        ("dispatch.interval_secs", config.dispatch.interval_secs),
        ("dispatch.max_concurrent_sends", config.dispatch.max_concurrent_sends as u64),
        ("dispatch.store_timeout_secs", config.dispatch.store_timeout_secs),
        ("sender.timeout_secs", config.sender.timeout_secs),
    ];
    for (field, value) in at_least_one {
        if value == 0 {
            errors.push(ConfigError::invalid(field, "must be at least 1"));
        }
    }

    if let Err(reason) = check_base_url(config.sender.base_url.trim()) {
        errors.push(ConfigError::invalid("sender.base_url", reason));
    }

    if let Some(token) = &config.sender.auth_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::invalid(
            "sender.auth_token",
            "must not be blank when set",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The send endpoint must be an absolute http(s) URL with a host.
fn check_base_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| format!("`{raw}` is not a valid URL: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("must be an http(s) URL, got scheme `{}`", parsed.scheme()));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(format!("`{raw}` has no host"));
    }
    Ok(())
}

/// Checks that only apply when the worker is about to send messages.
pub fn validate_for_serve(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    validate_config(config)?;
    if config.sender.auth_token.is_none() {
        return Err(vec![ConfigError::invalid(
            "sender.auth_token",
            "is required to run the dispatch loop (set COURIER_SENDER_AUTH_TOKEN)",
        )]);
    }
    Ok(())
}

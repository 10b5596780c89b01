// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::future::Future;
use std::time::Duration;

use courier_core::CourierError;

/// Await a store call, failing with [`CourierError::Timeout`] after `limit`.
pub(crate) async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, CourierError>>,
) -> Result<T, CourierError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| CourierError::Timeout { duration: limit })?
}

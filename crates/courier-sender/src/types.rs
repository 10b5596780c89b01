// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the send endpoint.

use serde::{Deserialize, Serialize};

/// Body of `POST {base_url}/send/{id}`.
///
/// `id` repeats the path parameter so the endpoint can deduplicate retries of
/// the same message. `phone` is the client's stored mobile number, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendRequest {
    pub id: i64,
    pub phone: String,
    pub text: String,
}

/// Response body the endpoint returns; only used for logging.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

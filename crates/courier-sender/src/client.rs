// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the send endpoint.
//!
//! One request per call. Retrying is left to the next dispatch cycle, so
//! there is no retry loop here.

use std::time::Duration;

use courier_core::CourierError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{SendRequest, SendResponse};

/// Result of a delivered request, whatever its status code.
#[derive(Debug)]
pub struct Delivery {
    pub status: StatusCode,
    pub body: String,
}

impl Delivery {
    /// Parsed response body, when it matches the documented shape.
    pub fn response(&self) -> Option<SendResponse> {
        serde_json::from_str(&self.body).ok()
    }
}

#[derive(Debug, Clone)]
pub struct SendClient {
    client: reqwest::Client,
    base_url: String,
}

impl SendClient {
    /// Build a client that authenticates every request with `auth_token`.
    ///
    /// `timeout` bounds the whole request, connect through body.
    pub fn new(base_url: &str, auth_token: &str, timeout: Duration) -> Result<Self, CourierError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(auth_token).map_err(|e| {
            CourierError::Config(format!("invalid sender.auth_token header value: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| CourierError::Sender {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, message_id: i64) -> String {
        format!("{}/send/{message_id}", self.base_url)
    }

    /// POST one message. Transport failures (including timeouts) are errors;
    /// any HTTP response, success or not, is a [`Delivery`].
    pub async fn post(&self, request: &SendRequest) -> Result<Delivery, CourierError> {
        let url = self.endpoint(request.id);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(%url, status = %status, "send endpoint responded");
        Ok(Delivery { status, body })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> CourierError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else {
        "request failed"
    };
    CourierError::Sender {
        message: format!("POST {url} {kind}: {e}"),
        source: Some(Box::new(e)),
    }
}

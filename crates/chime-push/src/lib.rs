// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push gateway client for the Chime notification service.
//!
//! Implements [`PushTransport`] over an Expo-compatible HTTP gateway:
//! exactly one POST per [`send`] call, no internal retry. Retry policy
//! lives in the outbox processor.
//!
//! [`send`]: PushTransport::send

use std::time::Duration;

use async_trait::async_trait;
use chime_config::model::PushConfig;
use chime_core::{ChimeError, PushTransport};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One push message on the wire.
#[derive(Debug, Serialize)]
struct PushMessage<'a> {
    to: &'a str,
    sound: &'a str,
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a serde_json::Value>,
}

/// Gateway acknowledgement for a single message.
///
/// Expo wraps the ticket in a `data` object; `status` is "ok" or "error".
#[derive(Debug, Deserialize)]
struct PushTicket {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    data: PushTicket,
}

/// HTTP push gateway client.
///
/// Holds a pooled `reqwest::Client` with a per-request timeout; cheap to
/// clone and share across drains.
#[derive(Debug, Clone)]
pub struct ExpoPush {
    client: reqwest::Client,
    gateway_url: String,
    sound: String,
}

impl ExpoPush {
    /// Creates a push client from configuration.
    pub fn new(config: &PushConfig) -> Result<Self, ChimeError> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChimeError::Push {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            gateway_url: config.gateway_url.clone(),
            sound: config.sound.clone(),
        })
    }
}

#[async_trait]
impl PushTransport for ExpoPush {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: Option<&serde_json::Value>,
    ) -> Result<(), ChimeError> {
        let message = PushMessage {
            to: token,
            sound: &self.sound,
            title,
            body,
            data,
        };

        let response = self
            .client
            .post(&self.gateway_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| ChimeError::Push {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "push gateway response received");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChimeError::Push {
                message: format!("gateway returned {status}: {text}"),
                source: None,
            });
        }

        // The gateway promises a JSON body; anything else is a failure.
        let parsed: PushResponse = response.json().await.map_err(|e| ChimeError::Push {
            message: format!("malformed gateway response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if parsed.data.status != "ok" {
            return Err(ChimeError::Push {
                message: format!(
                    "gateway rejected message: {}",
                    parsed.data.message.unwrap_or_else(|| parsed.data.status.clone())
                ),
                source: None,
            });
        }

        Ok(())
    }
}

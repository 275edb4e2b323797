// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Push transport trait for outbound delivery gateways.

use async_trait::async_trait;

use crate::error::ChimeError;

/// A transport that delivers a single push message to a device token.
///
/// Implementations make exactly one outbound request per call and never
/// retry internally; retry policy belongs to the outbox processor.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
    /// Sends one push message to `token`.
    ///
    /// Returns an error for transport failures, non-success gateway status,
    /// or a malformed gateway response.
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: Option<&serde_json::Value>,
    ) -> Result<(), ChimeError>;
}

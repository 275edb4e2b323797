// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Chime notification service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Chime configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChimeConfig {
    /// Service identity and scheduling settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Push gateway settings.
    #[serde(default)]
    pub push: PushConfig,

    /// Outbox processor settings.
    #[serde(default)]
    pub outbox: OutboxConfig,
}

/// Service identity and scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name of the service instance.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between outbox drains in `chime serve`.
    ///
    /// This interval is also the only backoff between delivery retries:
    /// each scheduled drain is one retry opportunity.
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            drain_interval_secs: default_drain_interval_secs(),
        }
    }
}

fn default_service_name() -> String {
    "chime".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_drain_interval_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "chime.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Push gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PushConfig {
    /// Push gateway endpoint URL.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,

    /// Sound name sent with each push message.
    #[serde(default = "default_sound")]
    pub sound: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            timeout_secs: default_push_timeout_secs(),
            sound: default_sound(),
        }
    }
}

fn default_gateway_url() -> String {
    "https://exp.host/--/api/v2/push/send".to_string()
}

fn default_push_timeout_secs() -> u64 {
    10
}

fn default_sound() -> String {
    "default".to_string()
}

/// Outbox processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutboxConfig {
    /// Maximum rows fetched per drain.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: i64,

    /// Attempts after which a row is dropped (marked processed without a
    /// successful delivery).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_limit: default_batch_limit(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_batch_limit() -> i64 {
    50
}

fn default_max_attempts() -> i64 {
    5
}

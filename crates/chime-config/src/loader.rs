// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./chime.toml` > `~/.config/chime/chime.toml` >
//! `/etc/chime/chime.toml` with environment variable overrides via the
//! `CHIME_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChimeConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chime/chime.toml` (system-wide)
/// 3. `~/.config/chime/chime.toml` (user XDG config)
/// 4. `./chime.toml` (local directory)
/// 5. `CHIME_*` environment variables
pub fn load_config() -> Result<ChimeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChimeConfig::default()))
        .merge(Toml::file("/etc/chime/chime.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("chime/chime.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("chime.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ChimeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChimeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChimeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChimeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `CHIME_STORAGE_DATABASE_PATH` must map
/// to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("CHIME_").map(|key| {
        // `key` keeps the env var's original casing with the prefix stripped.
        let key_str = key.as_str().to_ascii_lowercase();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("push_", "push.", 1)
            .replacen("outbox_", "outbox.", 1);
        mapped.into()
    })
}

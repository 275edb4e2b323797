// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Chime notification service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Chime workspace. The storage and push
//! crates implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ChimeError;
pub use traits::{NotificationStore, PushTransport};
pub use types::{
    CallMode, CallerProfile, DeliveryPayload, DrainSummary, IncomingCall, NotificationKind,
    NotificationRecord, OutboxCounts, OutboxEntry, now_rfc3339,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_error_has_all_variants() {
        let _config = ChimeError::Config("test".into());
        let _storage = ChimeError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _push = ChimeError::Push {
            message: "test".into(),
            source: None,
        };
        let _internal = ChimeError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_context() {
        let err = ChimeError::Push {
            message: "gateway returned 500".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "push error: gateway returned 500");

        let err = ChimeError::Config("push.gateway_url must not be empty".into());
        assert!(err.to_string().contains("gateway_url"));
    }

    #[test]
    fn trait_objects_are_constructible() {
        // Both seams must stay object-safe for dynamic dispatch.
        fn _assert_push(_: &dyn PushTransport) {}
        fn _assert_store(_: &dyn NotificationStore) {}
    }
}

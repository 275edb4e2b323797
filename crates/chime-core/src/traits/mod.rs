// SPDX-FileCopyrightText: 2026 Chime Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Chime service seams.
//!
//! Both traits use `#[async_trait]` for dynamic dispatch compatibility so
//! the outbox processor and call signal can run against mocks in tests.

pub mod push;
pub mod store;

pub use push::PushTransport;
pub use store::NotificationStore;

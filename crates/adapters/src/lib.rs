// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the host the scheduler runs inside

pub mod extension;
pub mod host;
pub mod traced;
pub mod wake;

pub use extension::{BackgroundExtension, ExpiryCallback, ExtensionId, NoOpExtensions};
pub use host::{Budget, HostEnvironment, UnrestrictedHost};
pub use traced::{TracedExtensions, TracedHost};
pub use wake::{NoOpWakeRegistrar, WakeError, WakeRegistrar, WakeTask};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use extension::{ExtensionCall, FakeExtensions};
#[cfg(any(test, feature = "test-support"))]
pub use host::FakeHost;
#[cfg(any(test, feature = "test-support"))]
pub use wake::{FakeWakeRegistrar, FakeWakeTask, WakeCall};

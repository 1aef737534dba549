// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background run extensions
//!
//! Hosts that suspend background work (mobile OSes) can grant a short
//! extension while a provider finishes. The scheduler begins one per provider
//! per cycle and ends it when the provider's batch completes.

mod noop;

pub use noop::NoOpExtensions;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExtensionCall, FakeExtensions};

use std::fmt;

/// Invoked by the host when an extension runs out before it was ended
pub type ExpiryCallback = Box<dyn FnOnce() + Send + 'static>;

/// Host-assigned identifier of an active extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExtensionId(pub u64);

impl fmt::Display for ExtensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ext-{}", self.0)
    }
}

/// Grants extra execution time while restricted
pub trait BackgroundExtension: Send + Sync + 'static {
    /// Request an extension on behalf of `provider`. `None` if the host declines.
    fn begin(&self, provider: &str, on_expire: ExpiryCallback) -> Option<ExtensionId>;

    /// Release an extension. Ending an unknown or already-ended id is harmless.
    fn end(&self, id: ExtensionId);
}

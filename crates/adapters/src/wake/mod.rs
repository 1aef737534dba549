// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wake-up registration with the host
//!
//! While the process is suspended the host, not the scheduler's own timer,
//! decides when work may resume. The controller submits the scheduler's next
//! wake time here and receives a [`WakeTask`] when the host grants one.

mod noop;

pub use noop::NoOpWakeRegistrar;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeWakeRegistrar, FakeWakeTask, WakeCall};

use std::time::Instant;
use thiserror::Error;

/// Errors from wake registration
#[derive(Debug, Error)]
pub enum WakeError {
    #[error("wake request rejected: {0}")]
    Rejected(String),
    #[error("wake registration unavailable")]
    Unavailable,
}

/// Submits and withdraws host wake requests
pub trait WakeRegistrar: Send + Sync + 'static {
    /// Ask to be woken no earlier than `earliest`
    fn submit(&self, earliest: Instant) -> Result<(), WakeError>;

    /// Withdraw any pending request
    fn cancel(&self);
}

/// A wake window granted by the host
pub trait WakeTask: Send + Sync {
    /// Report that work for this window is done
    fn complete(&self, success: bool);
}

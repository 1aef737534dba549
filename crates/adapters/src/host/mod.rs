// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host run budget and runtime condition signals

mod unrestricted;

pub use unrestricted::UnrestrictedHost;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHost;

use cadence_core::ConditionSnapshot;
use std::fmt;
use std::time::Duration;

/// Remaining execution time granted by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// No restriction in effect (e.g. the app is in the foreground)
    Unbounded,
    /// Restricted execution with this much time left
    Remaining(Duration),
}

impl Budget {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Budget::Remaining(left) if left.is_zero())
    }

    /// Whether work of the given estimate can start within the budget
    pub fn fits(&self, estimate: Duration) -> bool {
        match self {
            Budget::Unbounded => true,
            Budget::Remaining(left) => estimate < *left,
        }
    }

    /// Deduct an accepted estimate
    pub fn consume(&mut self, estimate: Duration) {
        if let Budget::Remaining(left) = self {
            *left = left.saturating_sub(estimate);
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Unbounded => write!(f, "unbounded"),
            Budget::Remaining(left) => write!(f, "{}ms", left.as_millis()),
        }
    }
}

/// Read-only view of the host, queried fresh at every cycle
///
/// Reads need no coordination with the scheduler: a snapshot taken at cycle
/// construction is all the core relies on.
pub trait HostEnvironment: Send + Sync + 'static {
    /// Execution time the host still grants
    fn remaining_budget(&self) -> Budget;

    /// Current network and battery signals
    fn conditions(&self) -> ConditionSnapshot;
}

#[cfg(test)]
#[path = "budget_tests.rs"]
mod tests;

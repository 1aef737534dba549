// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake host for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Budget, HostEnvironment};
use cadence_core::{ConditionSnapshot, NetworkStatus};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug)]
struct FakeHostState {
    budget: Budget,
    conditions: ConditionSnapshot,
    budget_reads: usize,
    condition_reads: usize,
}

/// Fake host whose budget and signals tests can change at will
#[derive(Clone, Debug)]
pub struct FakeHost {
    inner: Arc<Mutex<FakeHostState>>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    /// Unbounded budget, connected network, full battery
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeHostState {
                budget: Budget::Unbounded,
                conditions: ConditionSnapshot::new(NetworkStatus::Satisfied, Some(100.0)),
                budget_reads: 0,
                condition_reads: 0,
            })),
        }
    }

    pub fn set_budget(&self, budget: Budget) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).budget = budget;
    }

    pub fn set_remaining(&self, remaining: Duration) {
        self.set_budget(Budget::Remaining(remaining));
    }

    pub fn set_network(&self, network: NetworkStatus) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .conditions
            .network = network;
    }

    pub fn set_battery(&self, level: Option<f32>) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .conditions
            .battery_level = level;
    }

    /// How many times the budget was read
    pub fn budget_reads(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).budget_reads
    }

    /// How many times the condition snapshot was read
    pub fn condition_reads(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .condition_reads
    }
}

impl HostEnvironment for FakeHost {
    fn remaining_budget(&self) -> Budget {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.budget_reads += 1;
        inner.budget
    }

    fn conditions(&self) -> ConditionSnapshot {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.condition_reads += 1;
        inner.conditions
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
